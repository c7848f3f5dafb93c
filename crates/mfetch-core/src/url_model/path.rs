//! Filename extraction from URL path.

/// Extracts the last path segment from a URL for use as a filename stem.
///
/// Returns `None` if the URL cannot be parsed or the path is empty/root.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal() {
        assert_eq!(
            filename_from_url_path("https://rr2---sn-x.googlevideo.com/videoplayback?itag=251").as_deref(),
            Some("videoplayback")
        );
        assert_eq!(
            filename_from_url_path("https://cdn.example.com/a/b/track.m4a").as_deref(),
            Some("track.m4a")
        );
    }

    #[test]
    fn root_or_empty() {
        assert_eq!(filename_from_url_path("https://example.com/"), None);
        assert_eq!(filename_from_url_path("https://example.com"), None);
    }

    #[test]
    fn trailing_slash_uses_last_real_segment() {
        assert_eq!(
            filename_from_url_path("https://example.com/media/clip/").as_deref(),
            Some("clip")
        );
    }
}
