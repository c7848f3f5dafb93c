//! CLI for mfetch.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use mfetch_core::config;
use std::path::{Path, PathBuf};

use commands::{
    run_cache_size, run_checksum, run_completions, run_download, run_fetch, run_man, run_probe,
    run_search, DownloadArgs,
};

/// Top-level CLI for mfetch.
#[derive(Debug, Parser)]
#[command(name = "mfetch")]
#[command(about = "mfetch: parallel ranged media fetcher with CDN mirror selection", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch a direct media URL with parallel ranged requests.
    Fetch {
        /// Direct HTTP/HTTPS URL to download.
        url: String,
        /// Number of concurrent segments (default from config).
        #[arg(long, short = 'w', value_name = "N")]
        workers: Option<usize>,
        /// Directory to write the file into (default: current directory).
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
        /// Re-download sequentially and compare SHA-256 digests.
        #[arg(long)]
        verify: bool,
    },

    /// Probe sibling CDN edge hosts and report the fastest.
    Probe {
        /// CDN edge URL.
        url: String,
    },

    /// Search for a video by title.
    Search {
        /// Title to search for.
        title: String,
    },

    /// Resolve, download and cache media by page URL or title.
    Download {
        /// Page URL (YouTube, Spotify track, ...).
        #[arg(long, required_unless_present = "title")]
        url: Option<String>,
        /// Title to search for when no URL is given.
        #[arg(long)]
        title: Option<String>,
        /// Download video instead of audio.
        #[arg(long)]
        video: bool,
        /// Copy the cached file to this path.
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Show the media cache size.
    CacheSize,

    /// Compute SHA-256 of a file (e.g. after download).
    Checksum {
        /// Path to the file.
        path: String,
    },

    /// Print shell completions to stdout.
    Completions {
        shell: Shell,
    },

    /// Print the man page (roff) to stdout.
    Man,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        // Generators need no config on disk.
        match cli.command {
            CliCommand::Completions { shell } => return run_completions(shell),
            CliCommand::Man => return run_man(),
            _ => {}
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Fetch {
                url,
                workers,
                dir,
                verify,
            } => {
                let dir = match dir {
                    Some(d) => d,
                    None => std::env::current_dir()?,
                };
                let workers = workers.unwrap_or(cfg.workers);
                run_fetch(&cfg, &url, workers, &dir, verify).await?;
            }
            CliCommand::Probe { url } => run_probe(&cfg, &url).await?,
            CliCommand::Search { title } => run_search(&cfg, &title).await?,
            CliCommand::Download {
                url,
                title,
                video,
                out,
            } => {
                run_download(
                    &cfg,
                    DownloadArgs {
                        url,
                        title,
                        video,
                        out,
                    },
                )
                .await?
            }
            CliCommand::CacheSize => run_cache_size(&cfg).await?,
            CliCommand::Checksum { path } => run_checksum(Path::new(&path)).await?,
            CliCommand::Completions { .. } | CliCommand::Man => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
