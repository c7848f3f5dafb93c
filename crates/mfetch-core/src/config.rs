use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Caller-level retry parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of fetch attempts (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 10,
        }
    }
}

/// Global configuration loaded from `~/.config/mfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MfetchConfig {
    /// Default number of concurrent segments per fetch.
    pub workers: usize,
    /// Maximum concurrent mirror probes.
    pub probe_pool_size: usize,
    /// Per-probe timeout in milliseconds.
    pub probe_timeout_ms: u64,
    /// Lowest edge index tried when synthesizing mirror hosts.
    pub mirror_index_min: u32,
    /// Highest edge index tried (inclusive).
    pub mirror_index_max: u32,
    /// Domain whose edge hosts are eligible for mirror probing.
    pub cdn_domain: String,
    /// Timeout for the HEAD / streamed GET size probes.
    pub size_timeout_secs: u64,
    pub segment_connect_timeout_secs: u64,
    /// Hard wall-clock limit per segment.
    pub segment_timeout_secs: u64,
    /// Receive buffer size per segment transfer.
    pub chunk_bytes: usize,
    /// Title search endpoint (GET `?title=`, JSON response).
    pub search_api_url: String,
    pub search_timeout_secs: u64,
    /// Cache root; defaults to `~/.cache/mfetch` when unset.
    pub cache_dir: Option<PathBuf>,
    /// Cache is flushed once its total size exceeds this.
    pub max_cache_bytes: u64,
    /// External link extractor invoked by the command resolver.
    pub resolver_program: String,
    pub audio_format: String,
    pub video_format: String,
    /// Netscape cookies file passed to the resolver when it exists.
    pub cookie_file: Option<PathBuf>,
    /// Optional retry policy; if missing, built-in defaults are used.
    pub retry: Option<RetryConfig>,
}

impl Default for MfetchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            probe_pool_size: 5,
            probe_timeout_ms: 2000,
            mirror_index_min: 2,
            mirror_index_max: 6,
            cdn_domain: "googlevideo.com".to_string(),
            size_timeout_secs: 15,
            segment_connect_timeout_secs: 15,
            segment_timeout_secs: 600,
            chunk_bytes: 8 * 1024,
            search_api_url: "https://odd-block-a945.tenopno.workers.dev/search".to_string(),
            search_timeout_secs: 15,
            cache_dir: None,
            max_cache_bytes: 500 * 1024 * 1024,
            resolver_program: "yt-dlp".to_string(),
            audio_format: "worstaudio".to_string(),
            video_format: "worst[height<=240]".to_string(),
            cookie_file: None,
            retry: None,
        }
    }
}

impl MfetchConfig {
    /// Configured cache root, or the XDG cache home for `mfetch`.
    pub fn cache_root(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("mfetch")?;
        Ok(xdg_dirs.get_cache_home())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: MfetchConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
