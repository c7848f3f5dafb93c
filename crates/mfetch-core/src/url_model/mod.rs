//! URL modeling and output filename derivation.
//!
//! The output name is the URL's last path segment, sanitized for the local
//! filesystem, plus an extension inferred from mime tokens in the URL.

mod mime;
mod path;
mod sanitize;

pub use mime::{extension_from_mime_tokens, DEFAULT_EXTENSION};
pub use path::filename_from_url_path;
pub use sanitize::sanitize_filename;

/// Stem used when the URL path yields nothing usable.
const DEFAULT_STEM: &str = "download";

/// Derives the output filename for a fetched resource.
///
/// # Examples
///
/// - `output_filename("https://rr3---sn-x.googlevideo.com/videoplayback?mime=audio%2Fwebm")` → `"videoplayback.webm"`
/// - `output_filename("https://example.com/")` → `"download.bin"`
pub fn output_filename(url: &str) -> String {
    let ext = extension_from_mime_tokens(url).unwrap_or(DEFAULT_EXTENSION);
    let stem = filename_from_url_path(url)
        .map(|s| sanitize_filename(&s))
        .filter(|s| !s.is_empty() && s != "." && s != "..")
        .unwrap_or_else(|| DEFAULT_STEM.to_string());

    let suffix = format!(".{}", ext);
    if stem.to_ascii_lowercase().ends_with(&suffix) {
        stem
    } else {
        format!("{}{}", stem, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdn_link_gets_mime_extension() {
        assert_eq!(
            output_filename("https://rr3---sn-ab5l6nrs.googlevideo.com/videoplayback?mime=audio%2Fwebm"),
            "videoplayback.webm"
        );
        assert_eq!(
            output_filename("https://rr3---sn-ab5l6nrs.googlevideo.com/videoplayback?mime=video%2Fmp4"),
            "videoplayback.mp4"
        );
    }

    #[test]
    fn no_token_defaults_to_bin() {
        assert_eq!(output_filename("https://example.com/stream"), "stream.bin");
        assert_eq!(output_filename("https://example.com/"), "download.bin");
        assert_eq!(output_filename("http://127.0.0.1:8080/"), "download.bin");
    }

    #[test]
    fn extension_not_doubled() {
        assert_eq!(
            output_filename("https://cdn.example.com/song.M4A?mime=audio/mp4"),
            "song.M4A"
        );
    }

    #[test]
    fn reserved_names_fallback() {
        assert_eq!(output_filename("https://example.com/.."), "download.bin");
        assert_eq!(output_filename("https://example.com/___"), "download.bin");
    }
}
