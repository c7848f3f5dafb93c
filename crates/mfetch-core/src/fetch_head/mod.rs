//! Size resolution via HTTP metadata probes.
//!
//! Uses the curl crate (libcurl). A HEAD request is tried first; when it
//! yields no usable length the resource is requested with a plain GET whose
//! body is abandoned as soon as the headers are in.

mod parse;

pub(crate) use parse::{parse_content_range, parse_status_line};

use anyhow::{Context, Result};
use std::cell::{Cell, RefCell};
use std::str;
use std::time::Duration;

use crate::error::FetchError;

/// Metadata captured from the final response of a probe.
#[derive(Debug, Clone, Default)]
pub struct HeadResult {
    /// Status code of the final (post-redirect) response.
    pub status: Option<u32>,
    /// `Content-Length`, if present.
    pub content_length: Option<u64>,
    /// Denominator of `Content-Range: bytes a-b/TOTAL`, if present.
    pub content_range_total: Option<u64>,
    /// True if the server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
}

impl HeadResult {
    /// Total resource size, if the headers determine one. A 206 response's
    /// `Content-Length` is only the slice length, so the `Content-Range`
    /// denominator wins there. Zero is treated as unknown.
    pub fn total_size(&self) -> Option<u64> {
        let from_length = self.content_length.filter(|n| *n > 0);
        let from_range = self.content_range_total.filter(|n| *n > 0);
        if self.status == Some(206) {
            from_range
        } else {
            from_length.or(from_range)
        }
    }
}

/// Which request a probe sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Head,
    /// GET with the body abandoned after the headers.
    StreamedGet,
}

/// Sends one metadata request and parses the final response's headers.
/// Follows redirects; a streamed GET is abandoned after the headers.
fn perform_probe(url: &str, timeout: Duration, method: ProbeMethod) -> Result<HeadResult> {
    let headers: RefCell<Vec<String>> = RefCell::new(Vec::new());
    let body_abandoned = Cell::new(false);

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    if method == ProbeMethod::Head {
        easy.nobody(true)?;
    }
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(timeout)?;
    easy.timeout(timeout)?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                let line = s.trim_end();
                let mut h = headers.borrow_mut();
                if line.starts_with("HTTP/") {
                    // New response block (after a redirect): forget the old one.
                    h.clear();
                }
                h.push(line.to_string());
            }
            true
        })?;
        transfer.write_function(|_data| {
            body_abandoned.set(true);
            Ok(0)
        })?;
        match transfer.perform() {
            Ok(()) => {}
            Err(e) if e.is_write_error() && body_abandoned.get() => {}
            Err(e) => {
                return Err(e).with_context(|| format!("{:?} request failed", method));
            }
        }
    }

    let result = parse::parse_headers(&headers.borrow());
    let code = result
        .status
        .or_else(|| easy.response_code().ok())
        .unwrap_or(0);
    if !(200..300).contains(&code) {
        anyhow::bail!("{:?} {} returned HTTP {}", method, url, code);
    }
    Ok(result)
}

/// Determines the total size of `url` before a ranged download.
///
/// Tries HEAD (`Content-Length`, then `Content-Range` denominator) and then a
/// streamed GET. Fails with [`FetchError::SizeUnknown`] when neither yields
/// a non-zero length.
pub fn resolve_size(url: &str, timeout: Duration) -> Result<u64, FetchError> {
    resolve_size_with(url, |method| perform_probe(url, timeout, method))
}

/// Size resolution over an arbitrary probe function (lets tests script the
/// server's answers).
pub fn resolve_size_with<F>(url: &str, mut probe_fn: F) -> Result<u64, FetchError>
where
    F: FnMut(ProbeMethod) -> Result<HeadResult>,
{
    for method in [ProbeMethod::Head, ProbeMethod::StreamedGet] {
        match probe_fn(method) {
            Ok(head) => {
                if let Some(size) = head.total_size() {
                    tracing::debug!(url, ?method, size, "resolved resource size");
                    return Ok(size);
                }
                tracing::debug!(url, ?method, "probe returned no usable length");
            }
            Err(e) => tracing::debug!(url, ?method, "size probe failed: {:#}", e),
        }
    }
    Err(FetchError::SizeUnknown {
        url: url.to_string(),
    })
}
