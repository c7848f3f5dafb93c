//! Request-to-file media pipeline.
//!
//! search (title only) → Spotify mapping → cache lookup → link resolution →
//! parallel fetch with retry → cache store. Scratch output lives in a
//! per-request directory that is removed whatever the outcome.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::MediaCache;
use crate::config::MfetchConfig;
use crate::error::FetchError;
use crate::fetcher::Fetcher;
use crate::media::MediaKind;
use crate::resolver::{CommandResolver, LinkResolver};
use crate::retry::{classify_fetch, run_with_retry, RetryPolicy};
use crate::search::SearchClient;

/// What the caller wants: a page URL or a title to search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub url: Option<String>,
    pub title: Option<String>,
    pub kind: MediaKind,
}

impl MediaRequest {
    pub fn url(url: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            url: Some(url.into()),
            title: None,
            kind,
        }
    }

    pub fn title(title: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            url: None,
            title: Some(title.into()),
            kind,
        }
    }
}

pub struct Pipeline {
    cache: MediaCache,
    search: SearchClient,
    resolver: Arc<dyn LinkResolver>,
    fetcher: Fetcher,
    workers: usize,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn new(
        cache: MediaCache,
        search: SearchClient,
        resolver: Arc<dyn LinkResolver>,
        fetcher: Fetcher,
    ) -> Self {
        Self {
            cache,
            search,
            resolver,
            fetcher,
            workers: MfetchConfig::default().workers,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(cfg: &MfetchConfig) -> Result<Self> {
        let retry = cfg
            .retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default();
        Ok(Self::new(
            MediaCache::from_config(cfg)?,
            SearchClient::from_config(cfg),
            Arc::new(CommandResolver::from_config(cfg)),
            Fetcher::from_config(cfg),
        )
        .with_workers(cfg.workers)
        .with_retry(retry))
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &MediaCache {
        &self.cache
    }

    /// Returns the cached path of the requested media, downloading it first
    /// when it is not cached yet.
    pub fn obtain(&self, req: &MediaRequest) -> Result<PathBuf> {
        let source = match (&req.url, &req.title) {
            (Some(url), _) => url.clone(),
            (None, Some(title)) => self.search.search(title)?.link,
            (None, None) => bail!("either a URL or a title is required"),
        };
        let source = self.search.resolve_spotify(&source)?;

        let key = req.kind.cache_key(&source);
        if let Some(hit) = self.cache.lookup(req.kind, &key) {
            tracing::info!(kind = %req.kind, path = %hit.display(), "cache hit");
            return Ok(hit);
        }

        let direct = self
            .resolver
            .resolve(&source, req.kind)
            .with_context(|| format!("resolve media link for {}", source))?;

        let scratch = self.cache.request_dir()?;
        let fetched = run_with_retry(
            &self.retry,
            classify_fetch,
            discard_partial,
            |attempt| {
                tracing::debug!(attempt, url = %direct, "fetch attempt");
                self.fetcher.fetch(&direct, self.workers, scratch.path())
            },
        )
        .with_context(|| format!("download {} for {}", req.kind, source))?;

        let stored = self.cache.store(req.kind, &key, &fetched)?;
        drop(scratch);
        Ok(stored)
    }
}

fn discard_partial(e: &FetchError) {
    if let Some(path) = e.partial_path() {
        if let Err(err) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), "could not remove partial file: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingResolver(AtomicUsize);

    impl LinkResolver for CountingResolver {
        fn resolve(&self, _source_url: &str, _kind: MediaKind) -> Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            bail!("resolver should not be reached")
        }
    }

    fn pipeline(root: &std::path::Path, resolver: Arc<dyn LinkResolver>) -> Pipeline {
        Pipeline::new(
            MediaCache::open(root, 1 << 20).unwrap(),
            SearchClient::new("http://127.0.0.1:9/search", Duration::from_millis(100)),
            resolver,
            Fetcher::default().with_mirror(None),
        )
    }

    #[test]
    fn request_without_url_or_title_fails() {
        let root = tempfile::tempdir().unwrap();
        let p = pipeline(root.path(), Arc::new(CountingResolver(AtomicUsize::new(0))));
        let req = MediaRequest {
            url: None,
            title: None,
            kind: MediaKind::Audio,
        };
        let err = p.obtain(&req).unwrap_err();
        assert!(err.to_string().contains("URL or a title"));
    }

    #[test]
    fn cache_hit_skips_resolver() {
        let root = tempfile::tempdir().unwrap();
        let resolver = Arc::new(CountingResolver(AtomicUsize::new(0)));
        let p = pipeline(root.path(), resolver.clone());

        let url = "https://www.youtube.com/watch?v=abc";
        let key = MediaKind::Video.cache_key(url);
        let cached = p.cache().kind_dir(MediaKind::Video).join(format!("{}.mp4", key));
        std::fs::write(&cached, b"cached").unwrap();

        let got = p.obtain(&MediaRequest::url(url, MediaKind::Video)).unwrap();
        assert_eq!(got, cached);
        assert_eq!(resolver.0.load(Ordering::SeqCst), 0);

        // Same URL as audio is a different key: falls through to the resolver.
        assert!(p.obtain(&MediaRequest::url(url, MediaKind::Audio)).is_err());
        assert_eq!(resolver.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_fetch_leaves_no_scratch_files() {
        let root = tempfile::tempdir().unwrap();
        let p = pipeline(root.path(), Arc::new(crate::resolver::DirectLink));
        // Nothing listens on port 9: size resolution fails, not retried.
        let req = MediaRequest::url("http://127.0.0.1:9/videoplayback", MediaKind::Audio);
        assert!(p.obtain(&req).is_err());
        assert_eq!(std::fs::read_dir(root.path().join("tmp")).unwrap().count(), 0);
    }
}
