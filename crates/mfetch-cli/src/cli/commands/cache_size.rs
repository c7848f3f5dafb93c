//! `mfetch cache-size` – report media cache usage.

use anyhow::Result;
use mfetch_core::cache::MediaCache;
use mfetch_core::config::MfetchConfig;

pub async fn run_cache_size(cfg: &MfetchConfig) -> Result<()> {
    let cache = MediaCache::from_config(cfg)?;
    let used = cache.size();
    println!(
        "{}: {:.1} / {:.1} MiB",
        cache.root().display(),
        used as f64 / 1_048_576.0,
        cfg.max_cache_bytes as f64 / 1_048_576.0
    );
    Ok(())
}
