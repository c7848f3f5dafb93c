//! On-disk media cache.
//!
//! Layout under the root: `audio/<key>.<ext>`, `video/<key>.<ext>` and a
//! `tmp/` area holding one scratch directory per in-flight request.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::MfetchConfig;
use crate::media::MediaKind;
use crate::url_model::DEFAULT_EXTENSION;

const KINDS: [MediaKind; 2] = [MediaKind::Audio, MediaKind::Video];

#[derive(Debug, Clone)]
pub struct MediaCache {
    root: PathBuf,
    max_bytes: u64,
}

impl MediaCache {
    /// Opens (creating if needed) a cache rooted at `root`.
    pub fn open(root: impl Into<PathBuf>, max_bytes: u64) -> Result<Self> {
        let cache = Self {
            root: root.into(),
            max_bytes,
        };
        for kind in KINDS {
            let dir = cache.kind_dir(kind);
            fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let tmp = cache.tmp_root();
        fs::create_dir_all(&tmp).with_context(|| format!("create {}", tmp.display()))?;
        Ok(cache)
    }

    pub fn from_config(cfg: &MfetchConfig) -> Result<Self> {
        Self::open(cfg.cache_root()?, cfg.max_cache_bytes)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kind_dir(&self, kind: MediaKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    fn tmp_root(&self) -> PathBuf {
        self.root.join("tmp")
    }

    /// Any cached file named `<key>.*` for `kind`.
    pub fn lookup(&self, kind: MediaKind, key: &str) -> Option<PathBuf> {
        let prefix = format!("{}.", key);
        let entries = fs::read_dir(self.kind_dir(kind)).ok()?;
        let mut hits: Vec<PathBuf> = entries
            .flatten()
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
            .map(|e| e.path())
            .collect();
        hits.sort();
        hits.into_iter().next()
    }

    /// Moves `file` into the cache as `<key>.<ext>` and enforces the size
    /// limit. The stored entry itself survives a flush.
    pub fn store(&self, kind: MediaKind, key: &str, file: &Path) -> Result<PathBuf> {
        let ext = file
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_EXTENSION);
        let dest = self.kind_dir(kind).join(format!("{}.{}", key, ext));
        move_file(file, &dest)
            .with_context(|| format!("move {} to {}", file.display(), dest.display()))?;
        tracing::debug!(%kind, path = %dest.display(), "stored in cache");
        self.enforce_limit(Some(dest.as_path()));
        Ok(dest)
    }

    /// Combined size of the audio and video directories.
    pub fn size(&self) -> u64 {
        KINDS
            .iter()
            .map(|k| dir_size(&self.kind_dir(*k)))
            .sum()
    }

    /// Deletes every cached file when the cache exceeds its limit. Files
    /// that cannot be removed are logged and skipped.
    pub fn enforce_limit(&self, keep: Option<&Path>) {
        let total = self.size();
        if total <= self.max_bytes {
            return;
        }
        tracing::info!(total, limit = self.max_bytes, "cache over limit, flushing");
        for kind in KINDS {
            let Ok(entries) = fs::read_dir(self.kind_dir(kind)) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if Some(path.as_path()) == keep {
                    continue;
                }
                if let Err(e) = fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), "could not delete cache file: {}", e);
                }
            }
        }
    }

    /// Fresh scratch directory for one request; removed when dropped.
    pub fn request_dir(&self) -> Result<tempfile::TempDir> {
        tempfile::Builder::new()
            .prefix("req-")
            .tempdir_in(self.tmp_root())
            .context("create request scratch directory")
    }
}

fn dir_size(dir: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .filter_map(|e| e.metadata().ok())
        .map(|m| if m.is_dir() { 0 } else { m.len() })
        .sum()
}

/// Rename, falling back to copy + remove across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}
