//! Segmented downloader.
//!
//! Runs one worker thread per planned segment. Each worker issues a ranged
//! GET and writes into the shared, preallocated output file at its own
//! offsets. Workers report through their `SegmentTracker`; a failed worker
//! never stops the others, and nothing here retries.

mod segment;
mod single;
mod tracker;

pub use single::download_single;
pub use tracker::{SegmentState, SegmentTracker};

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use crate::config::MfetchConfig;
use crate::retry::SegmentError;
use crate::storage::StorageWriter;

/// Result of a single segment download.
pub type SegmentResult = Result<(), SegmentError>;

/// Per-transfer curl settings shared by every segment worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentOptions {
    /// Receive buffer size; bounds the size of each chunk written to disk.
    pub chunk_bytes: usize,
    pub connect_timeout: Duration,
    /// Abort when throughput stays below 1 KiB/s for this long.
    pub low_speed_time: Duration,
    /// Hard wall-clock limit for one segment.
    pub timeout: Duration,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            chunk_bytes: 8 * 1024,
            connect_timeout: Duration::from_secs(15),
            low_speed_time: Duration::from_secs(60),
            timeout: Duration::from_secs(600),
        }
    }
}

impl SegmentOptions {
    pub fn from_config(cfg: &MfetchConfig) -> Self {
        Self {
            // libcurl accepts 1 KiB .. 10 MiB receive buffers.
            chunk_bytes: cfg.chunk_bytes.clamp(1024, 10 * 1024 * 1024),
            connect_timeout: Duration::from_secs(cfg.segment_connect_timeout_secs),
            low_speed_time: Duration::from_secs(60),
            timeout: Duration::from_secs(cfg.segment_timeout_secs),
        }
    }
}

/// Downloads every segment in `trackers` concurrently (one thread each) and
/// waits for all of them to reach a terminal state.
///
/// Returns one `(segment index, result)` per segment, in completion order.
/// The storage file must already be preallocated to cover every segment.
pub fn download_segments(
    url: &str,
    trackers: Arc<[SegmentTracker]>,
    storage: &StorageWriter,
    opts: SegmentOptions,
) -> Vec<(usize, SegmentResult)> {
    let count = trackers.len();
    let (tx, rx) = mpsc::channel();
    let mut handles = Vec::with_capacity(count);

    for slot in 0..count {
        let worker_tx = tx.clone();
        let url = url.to_string();
        let storage = storage.clone();
        let worker_trackers = Arc::clone(&trackers);
        let handle = std::thread::Builder::new()
            .name(format!("segment-{}", slot))
            .spawn(move || {
                let tracker = &worker_trackers[slot];
                let segment = tracker.segment();
                tracker.mark_running();
                let _span = tracing::debug_span!(
                    "segment",
                    index = segment.index,
                    start = segment.start,
                    end = segment.end
                )
                .entered();
                let res = segment::download_one_segment(&url, &segment, &storage, tracker, &opts);
                match &res {
                    Ok(()) => {
                        tracker.mark_succeeded();
                        tracing::debug!(bytes = segment.len(), "segment complete");
                    }
                    Err(e) => {
                        tracker.mark_failed(e.to_string());
                        tracing::warn!("segment failed: {}", e);
                    }
                }
                let _ = worker_tx.send((segment.index, res));
            });
        match handle {
            Ok(h) => handles.push(h),
            Err(e) => {
                let tracker = &trackers[slot];
                let err = SegmentError::Worker(format!("could not spawn worker: {}", e));
                tracker.mark_failed(err.to_string());
                let _ = tx.send((tracker.segment().index, Err(err)));
            }
        }
    }
    drop(tx);

    let mut results: Vec<(usize, SegmentResult)> = rx.iter().collect();
    for h in handles {
        let _ = h.join();
    }

    // A worker that panicked never reported; count it as failed.
    for tracker in trackers.iter() {
        let index = tracker.segment().index;
        if !results.iter().any(|(i, _)| *i == index) {
            let err = SegmentError::Worker("worker panicked".to_string());
            tracker.mark_failed(err.to_string());
            results.push((index, Err(err)));
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MfetchConfig;

    #[test]
    fn options_follow_config() {
        let mut cfg = MfetchConfig::default();
        cfg.chunk_bytes = 16;
        cfg.segment_connect_timeout_secs = 3;
        cfg.segment_timeout_secs = 42;
        let opts = SegmentOptions::from_config(&cfg);
        assert_eq!(opts.chunk_bytes, 1024, "clamped to libcurl minimum");
        assert_eq!(opts.connect_timeout, Duration::from_secs(3));
        assert_eq!(opts.timeout, Duration::from_secs(42));
    }

    #[test]
    fn every_segment_reports_when_all_fail() {
        use crate::segmenter::plan_segments;
        use crate::storage::StorageWriterBuilder;

        let dir = tempfile::tempdir().unwrap();
        let mut builder = StorageWriterBuilder::create(&dir.path().join("out.bin")).unwrap();
        builder.preallocate(400).unwrap();
        let storage = builder.build();
        let trackers: Arc<[SegmentTracker]> = plan_segments(400, 4)
            .unwrap()
            .into_iter()
            .map(SegmentTracker::new)
            .collect();
        let opts = SegmentOptions {
            connect_timeout: Duration::from_secs(2),
            timeout: Duration::from_secs(5),
            ..SegmentOptions::default()
        };

        let mut results =
            download_segments("http://127.0.0.1:9/x.bin", Arc::clone(&trackers), &storage, opts);
        results.sort_by_key(|(i, _)| *i);
        let indices: Vec<usize> = results.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!(results.iter().all(|(_, r)| r.is_err()));
        assert!(trackers.iter().all(|t| t.state() == SegmentState::Failed));
    }

    #[test]
    fn worker_error_names_its_cause() {
        let e = SegmentError::Worker("worker panicked".to_string());
        assert_eq!(e.to_string(), "segment worker: worker panicked");
        assert!(std::error::Error::source(&e).is_none());
    }

    #[test]
    fn default_chunk_is_8k() {
        assert_eq!(SegmentOptions::default().chunk_bytes, 8192);
    }
}
