//! Fetch error taxonomy.
//!
//! `SizeUnknown` and `InvalidPlan` abort before any file exists.
//! `MirrorUnreachable` is produced while probing and absorbed by mirror
//! selection. Segment failures are collected per segment and surfaced as one
//! `FetchFailed` carrying the partial file path.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::retry::SegmentError;

/// A failed segment and the error its worker reported.
#[derive(Debug)]
pub struct SegmentFailure {
    pub index: usize,
    pub error: SegmentError,
}

/// Why a fetch that got past planning did not complete.
#[derive(Debug)]
pub enum FetchFailure {
    /// Creating or preallocating the output file failed.
    Allocation(std::io::Error),
    /// One or more segments ended in the failed state.
    Segments(Vec<SegmentFailure>),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Allocation(e) => write!(f, "allocation failed: {}", e),
            FetchFailure::Segments(failures) => {
                write!(f, "{} segment(s) failed", failures.len())?;
                if let Some(first) = failures.first() {
                    write!(f, " (segment {}: {})", first.index, first.error)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("could not determine the size of {url}")]
    SizeUnknown { url: String },

    #[error("invalid segment plan: total_size={total_size}, workers={workers}")]
    InvalidPlan { total_size: u64, workers: usize },

    #[error("no mirror candidate for {host} was reachable")]
    MirrorUnreachable { host: String },

    /// One segment's failure on its own. `Fetcher::fetch` reports segment
    /// failures inside `FetchFailed` so the partial path travels with them;
    /// this variant is what [`FetchError::into_segment_errors`] splits that
    /// aggregate into.
    #[error("segment {index} failed: {source}")]
    SegmentFailed {
        index: usize,
        #[source]
        source: SegmentError,
    },

    #[error("fetch into {} failed: {cause}", path.display())]
    FetchFailed { path: PathBuf, cause: FetchFailure },

    #[error("progress handle already used by another fetch")]
    ProgressInUse,
}

impl From<SegmentFailure> for FetchError {
    fn from(f: SegmentFailure) -> Self {
        FetchError::SegmentFailed {
            index: f.index,
            source: f.error,
        }
    }
}

impl FetchError {
    /// Path of the partially written file left behind by a failed download, if any.
    pub fn partial_path(&self) -> Option<&std::path::Path> {
        match self {
            FetchError::FetchFailed { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Splits a segment-level `FetchFailed` into one `SegmentFailed` per
    /// failed segment, in segment order. Any other error is returned as is.
    pub fn into_segment_errors(self) -> Vec<FetchError> {
        match self {
            FetchError::FetchFailed {
                cause: FetchFailure::Segments(failures),
                ..
            } => failures.into_iter().map(FetchError::from).collect(),
            other => vec![other],
        }
    }

    /// Indices of failed segments when the failure came from the download phase.
    pub fn failed_segments(&self) -> Vec<usize> {
        match self {
            FetchError::FetchFailed {
                cause: FetchFailure::Segments(failures),
                ..
            } => failures.iter().map(|f| f.index).collect(),
            FetchError::SegmentFailed { index, .. } => vec![*index],
            _ => Vec::new(),
        }
    }
}
