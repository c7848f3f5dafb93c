//! Progress reporting for a fetch (bytes done, ETA, rate).
//!
//! `FetchProgress` is shared between the fetcher and any observer; reading it
//! never blocks the download. `report_progress` turns it into a periodic
//! stream of `ProgressStats` for the CLI.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use crate::downloader::{SegmentState, SegmentTracker};

/// Lifecycle of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FetchPhase {
    Planning = 0,
    Allocating = 1,
    Downloading = 2,
    Completed = 3,
    Failed = 4,
}

impl FetchPhase {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => FetchPhase::Allocating,
            2 => FetchPhase::Downloading,
            3 => FetchPhase::Completed,
            4 => FetchPhase::Failed,
            _ => FetchPhase::Planning,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FetchPhase::Completed | FetchPhase::Failed)
    }
}

/// Snapshot of download progress for one fetch (CLI-friendly).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    pub phase: FetchPhase,
    /// Bytes written so far across all segments.
    pub bytes_done: u64,
    /// Total file size in bytes (0 while still planning).
    pub total_bytes: u64,
    /// Elapsed time since the download phase started (seconds).
    pub elapsed_secs: f64,
    pub segments_done: usize,
    pub segments_failed: usize,
    pub segment_count: usize,
}

impl ProgressStats {
    /// Total download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if rate is 0).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_bytes.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.bytes_done as f64 / self.total_bytes as f64).min(1.0)
    }
}

/// Live, lock-free view of one fetch.
///
/// Segment trackers are attached once planning is done; before that the
/// aggregate counters read as zero. A handle serves exactly one fetch.
#[derive(Debug)]
pub struct FetchProgress {
    claimed: AtomicBool,
    phase: AtomicU8,
    total: AtomicU64,
    trackers: OnceLock<Arc<[SegmentTracker]>>,
    started: OnceLock<Instant>,
}

impl Default for FetchProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchProgress {
    pub fn new() -> Self {
        Self {
            claimed: AtomicBool::new(false),
            phase: AtomicU8::new(FetchPhase::Planning as u8),
            total: AtomicU64::new(0),
            trackers: OnceLock::new(),
            started: OnceLock::new(),
        }
    }

    pub fn phase(&self) -> FetchPhase {
        FetchPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Resolved resource size, 0 until planning has finished.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    /// Per-segment trackers, empty until planning has finished.
    pub fn trackers(&self) -> &[SegmentTracker] {
        self.trackers.get().map(|t| &t[..]).unwrap_or(&[])
    }

    /// Sum of every segment's live byte counter.
    pub fn transferred(&self) -> u64 {
        self.trackers().iter().map(|t| t.transferred()).sum()
    }

    pub fn stats(&self) -> ProgressStats {
        let trackers = self.trackers();
        let segments_done = trackers
            .iter()
            .filter(|t| t.state() == SegmentState::Succeeded)
            .count();
        let segments_failed = trackers
            .iter()
            .filter(|t| t.state() == SegmentState::Failed)
            .count();
        ProgressStats {
            phase: self.phase(),
            bytes_done: self.transferred(),
            total_bytes: self.total(),
            elapsed_secs: self
                .started
                .get()
                .map(|s| s.elapsed().as_secs_f64())
                .unwrap_or(0.0),
            segments_done,
            segments_failed,
            segment_count: trackers.len(),
        }
    }

    /// Binds this handle to a fetch; false if one already owns it.
    pub(crate) fn claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn set_phase(&self, phase: FetchPhase) {
        self.phase.store(phase as u8, Ordering::Release);
        if phase == FetchPhase::Downloading {
            let _ = self.started.set(Instant::now());
        }
    }

    pub(crate) fn attach(&self, total: u64, trackers: Arc<[SegmentTracker]>) {
        self.total.store(total, Ordering::Release);
        let _ = self.trackers.set(trackers);
    }
}

/// Sends a `ProgressStats` snapshot every `interval` until the fetch reaches
/// a terminal phase (the final snapshot is always sent) or the receiver is
/// dropped. Spawn this with `tokio::spawn`.
pub async fn report_progress(
    progress: Arc<FetchProgress>,
    interval: Duration,
    tx: tokio::sync::mpsc::Sender<ProgressStats>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let stats = progress.stats();
        let done = stats.phase.is_terminal();
        if tx.send(stats).await.is_err() || done {
            break;
        }
    }
}
