//! Media kinds served by the pipeline.

use std::fmt;

use crate::checksum::sha256_hex;
use crate::config::MfetchConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Subdirectory of the cache root holding this kind.
    pub fn dir_name(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }

    /// Extractor format selector for this kind.
    pub fn format(self, cfg: &MfetchConfig) -> &str {
        match self {
            MediaKind::Audio => &cfg.audio_format,
            MediaKind::Video => &cfg.video_format,
        }
    }

    /// Cache key for `source_url`. Video keys are salted so the same page
    /// cached as audio and as video never collide.
    pub fn cache_key(self, source_url: &str) -> String {
        match self {
            MediaKind::Audio => sha256_hex(source_url),
            MediaKind::Video => sha256_hex(&format!("{}_video", source_url)),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}
