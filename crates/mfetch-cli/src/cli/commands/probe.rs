//! `mfetch probe` – report mirror latencies for a CDN edge URL.

use anyhow::Result;
use mfetch_core::config::MfetchConfig;
use mfetch_core::mirror::{CurlProber, MirrorProbe};
use std::sync::Arc;

pub async fn run_probe(cfg: &MfetchConfig, url: &str) -> Result<()> {
    let probe = MirrorProbe::from_config(cfg, Arc::new(CurlProber));
    let url_owned = url.to_string();
    let selection = tokio::task::spawn_blocking(move || probe.select_fastest(&url_owned)).await?;

    if selection.probed.is_empty() {
        println!("not a {} edge host; nothing to probe", cfg.cdn_domain);
        return Ok(());
    }
    for p in &selection.probed {
        match p.latency {
            Some(d) => println!("{:<48} {:>6} ms", p.candidate.host, d.as_millis()),
            None => println!("{:<48} unreachable", p.candidate.host),
        }
    }
    if selection.fell_back {
        println!("no candidate reachable; using original URL");
    } else {
        println!("selected: {}", selection.url);
    }
    Ok(())
}
