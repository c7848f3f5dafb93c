//! CDN mirror selection.
//!
//! Given a CDN edge URL, synthesizes sibling edge hosts, HEAD-probes them on
//! a bounded worker pool and picks the lowest-latency reachable one. The
//! selection is advisory: when nothing answers, the original URL is used.

mod host;
mod prober;

pub use host::CdnHost;
pub use prober::{CurlProber, HostProber};

use std::collections::VecDeque;
use std::ops::RangeInclusive;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::MfetchConfig;
use crate::error::FetchError;

/// One synthesized sibling of the original edge host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub host: String,
    pub url: String,
}

/// A probed candidate; `latency == None` means unreachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedCandidate {
    pub candidate: Candidate,
    pub latency: Option<Duration>,
}

/// Outcome of mirror selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorSelection {
    /// URL to download from.
    pub url: String,
    /// Latency of the chosen mirror; `None` when the original URL was kept.
    pub latency: Option<Duration>,
    /// True when candidates existed but none was reachable.
    pub fell_back: bool,
    /// Every probed candidate in enumeration order (empty if not a CDN host).
    pub probed: Vec<ProbedCandidate>,
}

impl MirrorSelection {
    fn unchanged(url: &str) -> Self {
        Self {
            url: url.to_string(),
            latency: None,
            fell_back: false,
            probed: Vec::new(),
        }
    }
}

/// Mirror prober configuration plus the transport used for probes.
#[derive(Clone)]
pub struct MirrorProbe {
    prober: Arc<dyn HostProber>,
    cdn_domain: String,
    indices: RangeInclusive<u32>,
    pool_size: usize,
    timeout: Duration,
}

impl std::fmt::Debug for MirrorProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorProbe")
            .field("cdn_domain", &self.cdn_domain)
            .field("indices", &self.indices)
            .field("pool_size", &self.pool_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for MirrorProbe {
    fn default() -> Self {
        Self::new(Arc::new(CurlProber))
    }
}

impl MirrorProbe {
    /// Defaults: `googlevideo.com`, indices 2..=6, pool of 5, 2 s per probe.
    pub fn new(prober: Arc<dyn HostProber>) -> Self {
        Self {
            prober,
            cdn_domain: "googlevideo.com".to_string(),
            indices: 2..=6,
            pool_size: 5,
            timeout: Duration::from_secs(2),
        }
    }

    pub fn from_config(cfg: &MfetchConfig, prober: Arc<dyn HostProber>) -> Self {
        Self {
            prober,
            cdn_domain: cfg.cdn_domain.clone(),
            indices: cfg.mirror_index_min..=cfg.mirror_index_max.max(cfg.mirror_index_min),
            pool_size: cfg.probe_pool_size.max(1),
            timeout: Duration::from_millis(cfg.probe_timeout_ms),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.cdn_domain = domain.into();
        self
    }

    pub fn with_indices(mut self, indices: RangeInclusive<u32>) -> Self {
        self.indices = indices;
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sibling URLs for `original_url`, or `None` if its host is not a CDN
    /// edge host. Scheme, port, path and query are preserved.
    pub fn candidates(&self, original_url: &str) -> Option<Vec<Candidate>> {
        let parsed = url::Url::parse(original_url).ok()?;
        let cdn = CdnHost::parse(parsed.host_str()?, &self.cdn_domain)?;
        let out = self
            .indices
            .clone()
            .filter_map(|i| {
                let host = cdn.with_index(i);
                let mut u = parsed.clone();
                u.set_host(Some(&host)).ok()?;
                Some(Candidate {
                    host,
                    url: u.to_string(),
                })
            })
            .collect();
        Some(out)
    }

    /// Probes all candidates concurrently on at most `pool_size` threads.
    /// Results keep the candidates' enumeration order.
    pub fn probe_all(&self, candidates: &[Candidate]) -> Vec<ProbedCandidate> {
        let count = candidates.len();
        if count == 0 {
            return Vec::new();
        }

        let work: Arc<Mutex<VecDeque<(usize, Candidate)>>> =
            Arc::new(Mutex::new(candidates.iter().cloned().enumerate().collect()));
        let (tx, rx) = mpsc::channel();
        let num_workers = self.pool_size.min(count);
        let mut handles = Vec::with_capacity(num_workers);
        for _ in 0..num_workers {
            let work = Arc::clone(&work);
            let tx = tx.clone();
            let prober = Arc::clone(&self.prober);
            let timeout = self.timeout;
            handles.push(std::thread::spawn(move || loop {
                let next = work.lock().ok().and_then(|mut q| q.pop_front());
                let Some((index, candidate)) = next else {
                    break;
                };
                let latency = prober.probe(&candidate.url, timeout);
                tracing::debug!(host = %candidate.host, ?latency, "probed mirror");
                let _ = tx.send((index, latency));
            }));
        }
        drop(tx);

        let mut latencies: Vec<Option<Duration>> = vec![None; count];
        for (index, latency) in rx.iter() {
            latencies[index] = latency;
        }
        for h in handles {
            let _ = h.join();
        }

        candidates
            .iter()
            .cloned()
            .zip(latencies)
            .map(|(candidate, latency)| ProbedCandidate { candidate, latency })
            .collect()
    }

    /// Picks the fastest URL for `original_url`. Never fails: non-CDN hosts
    /// are returned unchanged, and an all-unreachable probe set falls back
    /// to the original URL.
    pub fn select_fastest(&self, original_url: &str) -> MirrorSelection {
        let Some(candidates) = self.candidates(original_url) else {
            tracing::debug!(url = original_url, "not a CDN edge host, skipping mirror probe");
            return MirrorSelection::unchanged(original_url);
        };

        let probed = self.probe_all(&candidates);
        match pick_fastest(&probed) {
            Ok(best) => {
                let chosen = &probed[best];
                tracing::info!(
                    host = %chosen.candidate.host,
                    latency_ms = chosen.latency.map(|d| d.as_millis() as u64),
                    "selected fastest mirror"
                );
                MirrorSelection {
                    url: chosen.candidate.url.clone(),
                    latency: chosen.latency,
                    fell_back: false,
                    probed,
                }
            }
            Err(e) => {
                tracing::warn!("{}; using original URL", e);
                MirrorSelection {
                    url: original_url.to_string(),
                    latency: None,
                    fell_back: true,
                    probed,
                }
            }
        }
    }
}

/// Index of the minimum-latency reachable candidate. Unreachable maps to
/// `Duration::MAX` so the reduction stays total; ties go to the earlier
/// candidate. Fails when nothing was reachable.
pub fn pick_fastest(probed: &[ProbedCandidate]) -> Result<usize, FetchError> {
    let best = probed
        .iter()
        .enumerate()
        .map(|(i, p)| (p.latency.unwrap_or(Duration::MAX), i))
        .min();
    match best {
        Some((latency, i)) if latency != Duration::MAX => Ok(i),
        _ => Err(FetchError::MirrorUnreachable {
            host: probed
                .first()
                .map(|p| p.candidate.host.clone())
                .unwrap_or_default(),
        }),
    }
}
