//! Single-segment HTTP Range GET written into the shared output file.

use std::cell::{Cell, RefCell};
use std::str;

use crate::fetch_head::{parse_content_range, parse_status_line};
use crate::retry::SegmentError;
use crate::segmenter::Segment;
use crate::storage::StorageWriter;

use super::tracker::SegmentTracker;
use super::{SegmentOptions, SegmentResult};

/// Why the write callback refused a chunk.
#[derive(Debug)]
enum Abort {
    BadRange(u32),
    Overrun,
    Storage(std::io::Error),
}

/// Checks the final response block: 206 with a Content-Range matching the
/// segment exactly. Returns the status on mismatch.
fn validate_range_response(headers: &[String], segment: &Segment) -> Result<(), u32> {
    let status = headers
        .iter()
        .rev()
        .find(|l| l.starts_with("HTTP/"))
        .and_then(|l| parse_status_line(l))
        .unwrap_or(0);
    if status != 206 {
        return Err(status);
    }
    let matches = headers
        .iter()
        .filter_map(|l| l.split_once(':'))
        .filter(|(name, _)| name.trim().eq_ignore_ascii_case("content-range"))
        .filter_map(|(_, value)| parse_content_range(value))
        .any(|cr| cr.range == Some((segment.start, segment.end)));
    if matches {
        Ok(())
    } else {
        Err(status)
    }
}

/// Downloads one segment: GET with Range, each received chunk written at
/// `segment.start + bytes_so_far`. Never writes outside the segment; never
/// retries. Progress is published through `tracker`.
pub(super) fn download_one_segment(
    url: &str,
    segment: &Segment,
    storage: &StorageWriter,
    tracker: &SegmentTracker,
    opts: &SegmentOptions,
) -> SegmentResult {
    let headers: RefCell<Vec<String>> = RefCell::new(Vec::new());
    let range_checked = Cell::new(false);
    let written = Cell::new(0u64);
    let abort: RefCell<Option<Abort>> = RefCell::new(None);
    let limit = segment.len();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(SegmentError::Curl)?;
    easy.follow_location(true).map_err(SegmentError::Curl)?;
    easy.max_redirections(10).map_err(SegmentError::Curl)?;
    easy.buffer_size(opts.chunk_bytes).map_err(SegmentError::Curl)?;
    easy.connect_timeout(opts.connect_timeout)
        .map_err(SegmentError::Curl)?;
    // Abort if throughput drops below 1 KiB/s for the low-speed window.
    easy.low_speed_limit(1024).map_err(SegmentError::Curl)?;
    easy.low_speed_time(opts.low_speed_time)
        .map_err(SegmentError::Curl)?;
    easy.timeout(opts.timeout).map_err(SegmentError::Curl)?;
    easy.range(&segment.curl_range()).map_err(SegmentError::Curl)?;

    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    let line = s.trim_end();
                    let mut h = headers.borrow_mut();
                    if line.starts_with("HTTP/") {
                        h.clear();
                    }
                    h.push(line.to_string());
                }
                true
            })
            .map_err(SegmentError::Curl)?;
        transfer
            .write_function(|data| {
                if !range_checked.get() {
                    if let Err(status) = validate_range_response(&headers.borrow(), segment) {
                        *abort.borrow_mut() = Some(Abort::BadRange(status));
                        return Ok(0);
                    }
                    range_checked.set(true);
                }
                let off = written.get();
                let len = data.len() as u64;
                if !segment.contains_span(segment.start + off, len) {
                    *abort.borrow_mut() = Some(Abort::Overrun);
                    return Ok(0);
                }
                if let Err(e) = storage.write_at(segment.start + off, data) {
                    *abort.borrow_mut() = Some(Abort::Storage(e));
                    return Ok(0);
                }
                written.set(off + len);
                tracker.add_transferred(len);
                Ok(data.len())
            })
            .map_err(SegmentError::Curl)?;

        if let Err(e) = transfer.perform() {
            if e.is_write_error() {
                match abort.borrow_mut().take() {
                    Some(Abort::BadRange(status)) => {
                        return Err(SegmentError::InvalidRangeResponse { status })
                    }
                    Some(Abort::Overrun) => return Err(SegmentError::Overrun { limit }),
                    Some(Abort::Storage(io)) => return Err(SegmentError::Storage(io)),
                    None => {}
                }
            }
            return Err(SegmentError::Curl(e));
        }
    }

    let code = easy.response_code().map_err(SegmentError::Curl)?;
    if !(200..300).contains(&code) {
        return Err(SegmentError::Http(code));
    }
    if !range_checked.get() && limit > 0 {
        // No body at all: still reject a non-range answer explicitly.
        if let Err(status) = validate_range_response(&headers.borrow(), segment) {
            return Err(SegmentError::InvalidRangeResponse { status });
        }
    }

    let received = written.get();
    if received != limit {
        return Err(SegmentError::PartialTransfer {
            expected: limit,
            received,
        });
    }

    Ok(())
}
