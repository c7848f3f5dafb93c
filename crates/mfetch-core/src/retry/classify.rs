//! Classify HTTP status, curl errors and fetch failures into retry kinds.

use crate::error::{FetchError, FetchFailure};
use crate::retry::error::SegmentError;
use crate::retry::policy::ErrorKind;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify a segment error into an ErrorKind.
pub fn classify(e: &SegmentError) -> ErrorKind {
    match e {
        SegmentError::Curl(ce) => classify_curl_error(ce),
        SegmentError::Http(code) => classify_http_status(*code),
        SegmentError::PartialTransfer { .. } => ErrorKind::Connection,
        SegmentError::InvalidRangeResponse { .. }
        | SegmentError::Overrun { .. }
        | SegmentError::Storage(_)
        | SegmentError::Worker(_) => ErrorKind::Other,
    }
}

/// Classify a whole-fetch failure. A segment-level failure is as retryable
/// as its most retryable failed segment; planning and allocation errors are not.
pub fn classify_fetch(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::SegmentFailed { source, .. } => classify(source),
        FetchError::FetchFailed {
            cause: FetchFailure::Segments(failures),
            ..
        } => failures
            .iter()
            .map(|f| classify(&f.error))
            .find(|k| *k != ErrorKind::Other)
            .unwrap_or(ErrorKind::Other),
        _ => ErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SegmentFailure;
    use std::path::PathBuf;

    #[test]
    fn http_429_and_503_throttled() {
        assert_eq!(classify_http_status(429), ErrorKind::Throttled);
        assert_eq!(classify_http_status(503), ErrorKind::Throttled);
    }

    #[test]
    fn http_5xx_retryable() {
        assert!(matches!(classify_http_status(500), ErrorKind::Http5xx(500)));
        assert!(matches!(classify_http_status(502), ErrorKind::Http5xx(502)));
    }

    #[test]
    fn http_4xx_other() {
        assert_eq!(classify_http_status(404), ErrorKind::Other);
        assert_eq!(classify_http_status(403), ErrorKind::Other);
    }

    #[test]
    fn range_violations_are_not_retried() {
        assert_eq!(
            classify(&SegmentError::InvalidRangeResponse { status: 200 }),
            ErrorKind::Other
        );
        assert_eq!(classify(&SegmentError::Overrun { limit: 10 }), ErrorKind::Other);
        assert_eq!(
            classify(&SegmentError::Worker("worker panicked".to_string())),
            ErrorKind::Other
        );
        assert_eq!(
            classify(&SegmentError::PartialTransfer {
                expected: 10,
                received: 4
            }),
            ErrorKind::Connection
        );
    }

    #[test]
    fn fetch_failure_takes_first_retryable_segment() {
        let err = FetchError::FetchFailed {
            path: PathBuf::from("x.bin"),
            cause: FetchFailure::Segments(vec![
                SegmentFailure {
                    index: 0,
                    error: SegmentError::Http(404),
                },
                SegmentFailure {
                    index: 1,
                    error: SegmentError::Http(502),
                },
            ]),
        };
        assert_eq!(classify_fetch(&err), ErrorKind::Http5xx(502));
    }

    #[test]
    fn planning_failures_not_retryable() {
        let err = FetchError::InvalidPlan {
            total_size: 0,
            workers: 4,
        };
        assert_eq!(classify_fetch(&err), ErrorKind::Other);
        let alloc = FetchError::FetchFailed {
            path: PathBuf::from("x.bin"),
            cause: FetchFailure::Allocation(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )),
        };
        assert_eq!(classify_fetch(&alloc), ErrorKind::Other);
    }
}
