//! `mfetch fetch` – parallel ranged download of a direct URL.

use anyhow::{bail, Context, Result};
use mfetch_core::checksum;
use mfetch_core::config::MfetchConfig;
use mfetch_core::downloader::{download_single, SegmentOptions};
use mfetch_core::progress::{self, FetchProgress, ProgressStats};
use mfetch_core::{FetchError, Fetcher};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const PROGRESS_INTERVAL_MS: u64 = 500;

pub async fn run_fetch(
    cfg: &MfetchConfig,
    url: &str,
    workers: usize,
    dir: &Path,
    verify: bool,
) -> Result<()> {
    let fetcher = Fetcher::from_config(cfg);
    let progress = Arc::new(FetchProgress::new());

    let (stats_tx, stats_rx) = tokio::sync::mpsc::channel::<ProgressStats>(16);
    let reporter = tokio::spawn(progress::report_progress(
        Arc::clone(&progress),
        Duration::from_millis(PROGRESS_INTERVAL_MS),
        stats_tx,
    ));
    let printer = tokio::spawn(print_progress(stats_rx));

    let task_progress = Arc::clone(&progress);
    let task_url = url.to_string();
    let task_dir = dir.to_path_buf();
    let res = tokio::task::spawn_blocking(move || {
        fetcher.fetch_with_progress(&task_url, workers, &task_dir, &task_progress)
    })
    .await?;
    let _ = reporter.await;
    let _ = printer.await;

    let path = match res {
        Ok(path) => path,
        Err(e @ FetchError::FetchFailed { .. }) => {
            let summary = e.to_string();
            if let Some(partial) = e.partial_path() {
                eprintln!("partial file kept at {}", partial.display());
            }
            if !e.failed_segments().is_empty() {
                for seg in e.into_segment_errors() {
                    eprintln!("  {}", seg);
                }
            }
            bail!(summary);
        }
        Err(e) => return Err(e.into()),
    };
    println!("saved {}", path.display());

    if verify {
        let reference = dir.join(format!(
            ".{}.verify",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        ));
        let expected_len = progress.total();
        let opts = SegmentOptions::from_config(cfg);
        let ref_url = url.to_string();
        let ref_path = reference.clone();
        let fetched = path.clone();
        let (got, want) = tokio::task::spawn_blocking(move || -> Result<(String, String)> {
            download_single(&ref_url, &ref_path, Some(expected_len), &opts)
                .context("sequential reference download")?;
            let got = checksum::sha256_path(&fetched)?;
            let want = checksum::sha256_path(&ref_path)?;
            Ok((got, want))
        })
        .await?
        .inspect_err(|_| {
            let _ = std::fs::remove_file(&reference);
        })?;
        let _ = std::fs::remove_file(&reference);
        if got != want {
            bail!("checksum mismatch: parallel {} vs sequential {}", got, want);
        }
        println!("verified sha256 {}", got);
    }
    Ok(())
}

async fn print_progress(mut rx: tokio::sync::mpsc::Receiver<ProgressStats>) {
    while let Some(stats) = rx.recv().await {
        if stats.total_bytes == 0 {
            continue;
        }
        let done_mib = stats.bytes_done as f64 / 1_048_576.0;
        let total_mib = stats.total_bytes as f64 / 1_048_576.0;
        let pct = stats.fraction() * 100.0;
        let rate_mib = stats.bytes_per_sec() / 1_048_576.0;
        let eta = stats
            .eta_secs()
            .map(|s| format!("{:.0}s", s))
            .unwrap_or_else(|| "?".to_string());
        println!(
            "  {:.1} / {:.1} MiB ({:.1}%)  {:.2} MiB/s  ETA {}  [{}/{} segments]",
            done_mib, total_mib, pct, rate_mib, eta, stats.segments_done, stats.segment_count
        );
    }
}
