//! Parse HTTP response header lines into HeadResult.

use super::HeadResult;

/// Parse collected header lines into a HeadResult. Only the last response
/// block counts; callers drop earlier blocks (redirects) as they collect.
pub(crate) fn parse_headers(lines: &[String]) -> HeadResult {
    let mut status = None;
    let mut content_length = None;
    let mut content_range_total = None;
    let mut accept_ranges = false;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            status = parse_status_line(line);
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse::<u64>().ok();
            } else if name.eq_ignore_ascii_case("content-range") {
                content_range_total = parse_content_range(value).and_then(|r| r.total);
            } else if name.eq_ignore_ascii_case("accept-ranges") {
                accept_ranges = value.eq_ignore_ascii_case("bytes");
            }
        }
    }

    HeadResult {
        status,
        content_length,
        content_range_total,
        accept_ranges,
    }
}

/// Status code from a line like `HTTP/1.1 206 Partial Content`.
pub(crate) fn parse_status_line(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse().ok()
}

/// Parsed `Content-Range` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ContentRange {
    /// `(first, last)` inclusive, absent for `bytes */TOTAL`.
    pub range: Option<(u64, u64)>,
    /// Denominator, absent for `bytes a-b/*`.
    pub total: Option<u64>,
}

/// Parse `bytes a-b/TOTAL`, `bytes */TOTAL` or `bytes a-b/*`.
pub(crate) fn parse_content_range(value: &str) -> Option<ContentRange> {
    let rest = value.trim();
    let rest = rest
        .strip_prefix("bytes")
        .or_else(|| rest.strip_prefix("BYTES"))?
        .trim_start_matches([' ', '=']);
    let (span, total) = rest.split_once('/')?;
    let total = match total.trim() {
        "*" => None,
        t => Some(t.parse::<u64>().ok()?),
    };
    let range = match span.trim() {
        "*" => None,
        s => {
            let (a, b) = s.split_once('-')?;
            Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
        }
    };
    Some(ContentRange { range, total })
}
