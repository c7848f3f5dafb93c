//! `mfetch download` – full pipeline: search, resolve, fetch, cache.

use anyhow::{Context, Result};
use mfetch_core::config::MfetchConfig;
use mfetch_core::{MediaKind, MediaRequest, Pipeline};
use std::path::PathBuf;

#[derive(Debug)]
pub struct DownloadArgs {
    pub url: Option<String>,
    pub title: Option<String>,
    pub video: bool,
    pub out: Option<PathBuf>,
}

pub async fn run_download(cfg: &MfetchConfig, args: DownloadArgs) -> Result<()> {
    let pipeline = Pipeline::from_config(cfg)?;
    let req = MediaRequest {
        url: args.url,
        title: args.title,
        kind: if args.video {
            MediaKind::Video
        } else {
            MediaKind::Audio
        },
    };
    let cached = tokio::task::spawn_blocking(move || pipeline.obtain(&req)).await??;

    match args.out {
        Some(out) => {
            std::fs::copy(&cached, &out)
                .with_context(|| format!("copy {} to {}", cached.display(), out.display()))?;
            println!("{}", out.display());
        }
        None => println!("{}", cached.display()),
    }
    Ok(())
}
