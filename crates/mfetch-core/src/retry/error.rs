//! Segment download error type.

use std::fmt;

/// Error returned by a single segment worker (curl failure, HTTP error, bad
/// range response, storage or worker failure). Kept typed so the caller-level retry
/// policy can classify it.
#[derive(Debug)]
pub enum SegmentError {
    /// Curl reported an error (timeout, connection, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// Server answered 2xx but not with the requested byte range
    /// (e.g. 200 with the whole body, or a mismatched Content-Range).
    InvalidRangeResponse { status: u32 },
    /// Server sent more bytes than the segment holds; nothing past the
    /// segment end was written.
    Overrun { limit: u64 },
    /// Transfer completed but fewer bytes arrived than the segment length.
    PartialTransfer { expected: u64, received: u64 },
    /// Disk write failed (e.g. disk full).
    Storage(std::io::Error),
    /// The worker thread could not be spawned or panicked before reporting.
    Worker(String),
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentError::Curl(e) => write!(f, "{}", e),
            SegmentError::Http(code) => write!(f, "HTTP {}", code),
            SegmentError::InvalidRangeResponse { status } => {
                write!(f, "server ignored range request (HTTP {})", status)
            }
            SegmentError::Overrun { limit } => {
                write!(f, "server sent more than the {} requested bytes", limit)
            }
            SegmentError::PartialTransfer { expected, received } => {
                write!(f, "partial transfer: expected {} bytes, got {}", expected, received)
            }
            SegmentError::Storage(e) => write!(f, "storage: {}", e),
            SegmentError::Worker(msg) => write!(f, "segment worker: {}", msg),
        }
    }
}

impl std::error::Error for SegmentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SegmentError::Curl(e) => Some(e),
            SegmentError::Storage(e) => Some(e),
            SegmentError::Http(_)
            | SegmentError::InvalidRangeResponse { .. }
            | SegmentError::Overrun { .. }
            | SegmentError::PartialTransfer { .. }
            | SegmentError::Worker(_) => None,
        }
    }
}
