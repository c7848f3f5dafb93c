//! Reachability/latency probe for one candidate URL.

use std::time::{Duration, Instant};

/// Measures how quickly a URL answers. `None` means unreachable (error,
/// timeout, or an HTTP error status).
pub trait HostProber: Send + Sync {
    fn probe(&self, url: &str, timeout: Duration) -> Option<Duration>;
}

/// HEAD request via libcurl; latency is the wall time to the final header.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlProber;

impl CurlProber {
    fn head(url: &str, timeout: Duration) -> Result<u32, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.nobody(true)?;
        // A redirect already proves the edge is alive.
        easy.follow_location(false)?;
        easy.connect_timeout(timeout)?;
        easy.timeout(timeout)?;
        easy.perform()?;
        easy.response_code()
    }
}

impl HostProber for CurlProber {
    fn probe(&self, url: &str, timeout: Duration) -> Option<Duration> {
        let started = Instant::now();
        match Self::head(url, timeout) {
            Ok(code) if (200..400).contains(&code) => Some(started.elapsed()),
            Ok(code) => {
                tracing::debug!(url, code, "mirror answered with error status");
                None
            }
            Err(e) => {
                tracing::debug!(url, "mirror probe failed: {}", e);
                None
            }
        }
    }
}
