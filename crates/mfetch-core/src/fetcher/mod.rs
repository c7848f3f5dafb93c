//! Parallel fetch orchestration.
//!
//! `Planning -> Allocating -> Downloading -> {Completed | Failed}`:
//! pick a mirror, resolve the size, plan segments, create and preallocate the
//! output file, then run one worker per segment and join on all of them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::MfetchConfig;
use crate::downloader::{self, SegmentOptions, SegmentTracker};
use crate::error::{FetchError, FetchFailure, SegmentFailure};
use crate::fetch_head;
use crate::mirror::{CurlProber, MirrorProbe};
use crate::progress::{FetchPhase, FetchProgress};
use crate::segmenter::plan_segments;
use crate::storage::StorageWriterBuilder;
use crate::url_model::output_filename;

/// Parallel ranged downloader for a single resource.
#[derive(Debug, Clone)]
pub struct Fetcher {
    mirror: Option<MirrorProbe>,
    size_timeout: Duration,
    segment_opts: SegmentOptions,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self {
            mirror: Some(MirrorProbe::default()),
            size_timeout: Duration::from_secs(15),
            segment_opts: SegmentOptions::default(),
        }
    }
}

impl Fetcher {
    pub fn from_config(cfg: &MfetchConfig) -> Self {
        Self {
            mirror: Some(MirrorProbe::from_config(cfg, Arc::new(CurlProber))),
            size_timeout: Duration::from_secs(cfg.size_timeout_secs),
            segment_opts: SegmentOptions::from_config(cfg),
        }
    }

    /// Replaces the mirror prober; `None` downloads from the given URL as is.
    pub fn with_mirror(mut self, mirror: Option<MirrorProbe>) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn with_segment_options(mut self, opts: SegmentOptions) -> Self {
        self.segment_opts = opts;
        self
    }

    pub fn with_size_timeout(mut self, timeout: Duration) -> Self {
        self.size_timeout = timeout;
        self
    }

    /// Downloads `url` into `dest_dir` with `workers` concurrent segments and
    /// returns the path of the completed file.
    ///
    /// On `FetchFailed` the partial file stays on disk at the reported path.
    pub fn fetch(&self, url: &str, workers: usize, dest_dir: &Path) -> Result<PathBuf, FetchError> {
        self.fetch_with_progress(url, workers, dest_dir, &FetchProgress::new())
    }

    /// Like [`Fetcher::fetch`], publishing phase and byte counters through
    /// `progress` while it runs. `progress` must be fresh; a handle that
    /// already served a fetch is rejected with `ProgressInUse` and left as is.
    pub fn fetch_with_progress(
        &self,
        url: &str,
        workers: usize,
        dest_dir: &Path,
        progress: &FetchProgress,
    ) -> Result<PathBuf, FetchError> {
        if !progress.claim() {
            return Err(FetchError::ProgressInUse);
        }
        let res = self.run(url, workers, dest_dir, progress);
        progress.set_phase(match res {
            Ok(_) => FetchPhase::Completed,
            Err(_) => FetchPhase::Failed,
        });
        res
    }

    fn run(
        &self,
        url: &str,
        workers: usize,
        dest_dir: &Path,
        progress: &FetchProgress,
    ) -> Result<PathBuf, FetchError> {
        let _span = tracing::info_span!("fetch", url, workers).entered();
        progress.set_phase(FetchPhase::Planning);

        let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }
        // Plan validity does not depend on the network; fail fast.
        if workers == 0 {
            return Err(FetchError::InvalidPlan {
                total_size: 0,
                workers,
            });
        }

        let source = match &self.mirror {
            Some(probe) => probe.select_fastest(url).url,
            None => url.to_string(),
        };
        let total = fetch_head::resolve_size(&source, self.size_timeout)?;
        let segments = plan_segments(total, workers)?;
        tracing::info!(source = %source, total, segments = segments.len(), "planned fetch");

        let trackers: Arc<[SegmentTracker]> =
            segments.into_iter().map(SegmentTracker::new).collect();
        progress.attach(total, Arc::clone(&trackers));

        progress.set_phase(FetchPhase::Allocating);
        let path = dest_dir.join(output_filename(url));
        let allocation_failed = |e: std::io::Error| FetchError::FetchFailed {
            path: path.clone(),
            cause: FetchFailure::Allocation(e),
        };
        let mut builder = StorageWriterBuilder::create(&path).map_err(allocation_failed)?;
        builder.preallocate(total).map_err(allocation_failed)?;
        let storage = builder.build();

        progress.set_phase(FetchPhase::Downloading);
        let results = downloader::download_segments(
            &source,
            Arc::clone(&trackers),
            &storage,
            self.segment_opts,
        );

        let mut failures: Vec<SegmentFailure> = results
            .into_iter()
            .filter_map(|(index, res)| res.err().map(|error| SegmentFailure { index, error }))
            .collect();
        if !failures.is_empty() {
            failures.sort_by_key(|f| f.index);
            tracing::warn!(
                failed = failures.len(),
                path = %path.display(),
                "fetch failed, partial file left in place"
            );
            return Err(FetchError::FetchFailed {
                path,
                cause: FetchFailure::Segments(failures),
            });
        }

        storage.sync().map_err(allocation_failed)?;
        tracing::info!(path = %path.display(), bytes = total, "fetch complete");
        Ok(path)
    }
}
