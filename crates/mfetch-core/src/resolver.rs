//! Link resolution: turns a page URL into a direct CDN media URL.
//!
//! The fetch core only sees the resulting URL; how it was obtained is
//! behind the `LinkResolver` trait.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::process::Command;

use crate::config::MfetchConfig;
use crate::media::MediaKind;

/// Resolves a source URL to a direct, range-capable media URL.
pub trait LinkResolver: Send + Sync {
    fn resolve(&self, source_url: &str, kind: MediaKind) -> Result<String>;
}

/// Identity resolver for inputs that already are direct links.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectLink;

impl LinkResolver for DirectLink {
    fn resolve(&self, source_url: &str, _kind: MediaKind) -> Result<String> {
        Ok(source_url.to_string())
    }
}

/// Runs an external extractor (yt-dlp compatible command line):
/// `<program> --get-url --no-playlist -f <format> [--cookies <file>] <url>`.
#[derive(Debug, Clone)]
pub struct CommandResolver {
    program: String,
    audio_format: String,
    video_format: String,
    cookie_file: Option<PathBuf>,
}

impl CommandResolver {
    pub fn new(program: impl Into<String>) -> Self {
        let defaults = MfetchConfig::default();
        Self {
            program: program.into(),
            audio_format: defaults.audio_format,
            video_format: defaults.video_format,
            cookie_file: None,
        }
    }

    pub fn from_config(cfg: &MfetchConfig) -> Self {
        Self {
            program: cfg.resolver_program.clone(),
            audio_format: MediaKind::Audio.format(cfg).to_string(),
            video_format: MediaKind::Video.format(cfg).to_string(),
            cookie_file: cfg.cookie_file.clone(),
        }
    }

    pub fn with_cookie_file(mut self, path: Option<PathBuf>) -> Self {
        self.cookie_file = path;
        self
    }

    fn args(&self, source_url: &str, kind: MediaKind) -> Vec<String> {
        let format = match kind {
            MediaKind::Audio => &self.audio_format,
            MediaKind::Video => &self.video_format,
        };
        let mut args = vec![
            "--get-url".to_string(),
            "--no-playlist".to_string(),
            "-f".to_string(),
            format.clone(),
        ];
        match &self.cookie_file {
            Some(path) if path.is_file() => {
                args.push("--cookies".to_string());
                args.push(path.display().to_string());
            }
            Some(path) => {
                tracing::warn!(
                    path = %path.display(),
                    "cookie file not found, continuing without cookies"
                );
            }
            None => {}
        }
        args.push(source_url.to_string());
        args
    }
}

impl LinkResolver for CommandResolver {
    fn resolve(&self, source_url: &str, kind: MediaKind) -> Result<String> {
        let args = self.args(source_url, kind);
        tracing::debug!(program = %self.program, ?args, "running link resolver");
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .with_context(|| format!("run {}", self.program))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }
        first_line(&String::from_utf8_lossy(&output.stdout))
            .with_context(|| format!("{} printed no URL for {}", self.program, source_url))
    }
}

/// First non-empty line of extractor output.
fn first_line(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_link_is_identity() {
        let url = "https://rr3---sn-ab5l6nrs.googlevideo.com/videoplayback?mime=audio%2Fwebm";
        assert_eq!(DirectLink.resolve(url, MediaKind::Audio).unwrap(), url);
    }

    #[test]
    fn first_line_skips_blanks() {
        assert_eq!(
            first_line("\n  \nhttps://a.example/x\nhttps://b.example/y\n").as_deref(),
            Some("https://a.example/x")
        );
        assert_eq!(first_line(" \n"), None);
    }

    #[test]
    fn args_use_kind_format() {
        let r = CommandResolver::new("yt-dlp");
        assert_eq!(
            r.args("https://youtu.be/x", MediaKind::Audio),
            vec!["--get-url", "--no-playlist", "-f", "worstaudio", "https://youtu.be/x"]
        );
        let v = r.args("https://youtu.be/x", MediaKind::Video);
        assert_eq!(v[3], "worst[height<=240]");
    }

    #[test]
    fn missing_cookie_file_is_skipped() {
        let r = CommandResolver::new("yt-dlp")
            .with_cookie_file(Some(PathBuf::from("/nonexistent/cookies.txt")));
        assert!(!r.args("u", MediaKind::Audio).contains(&"--cookies".to_string()));

        let cookies = tempfile::NamedTempFile::new().unwrap();
        let r = r.with_cookie_file(Some(cookies.path().to_path_buf()));
        let args = r.args("u", MediaKind::Audio);
        let at = args.iter().position(|a| a == "--cookies").unwrap();
        assert_eq!(args[at + 1], cookies.path().display().to_string());
        assert_eq!(args.last().unwrap(), "u");
    }

    #[cfg(unix)]
    #[test]
    fn command_resolver_failure_is_error() {
        let r = CommandResolver::new("false");
        assert!(r.resolve("https://youtu.be/x", MediaKind::Audio).is_err());
        let r = CommandResolver::new("true");
        assert!(r.resolve("https://youtu.be/x", MediaKind::Audio).is_err());
    }
}
