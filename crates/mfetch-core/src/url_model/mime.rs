//! File extension inference from mime tokens embedded in CDN URLs.
//!
//! Media CDN links carry the stream type in the query string
//! (e.g. `mime=audio%2Fwebm`), which is the only reliable hint before the
//! body is fetched.

/// Extension used when no known mime token appears in the URL.
pub const DEFAULT_EXTENSION: &str = "bin";

/// Known mime tokens, most specific first.
const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("audio/mp4", "m4a"),
    ("audio/webm", "webm"),
    ("audio/mpeg", "mp3"),
    ("audio/ogg", "ogg"),
    ("video/mp4", "mp4"),
    ("video/webm", "webm"),
    ("video/3gpp", "3gp"),
];

/// Returns the extension for the first known mime token found in the URL's
/// (percent-decoded) query values or path, or `None` when nothing matches.
pub fn extension_from_mime_tokens(url: &str) -> Option<&'static str> {
    let parsed = url::Url::parse(url).ok()?;
    let mut haystacks: Vec<String> = parsed
        .query_pairs()
        .map(|(_, v)| v.to_ascii_lowercase())
        .collect();
    haystacks.push(parsed.path().to_ascii_lowercase());

    MIME_EXTENSIONS
        .iter()
        .find(|(token, _)| haystacks.iter().any(|h| h.contains(token)))
        .map(|(_, ext)| *ext)
}
