//! Title search against an external JSON API.
//!
//! `GET <endpoint>?title=<query>` answers `{"title", "link", "duration"}`.
//! The same endpoint maps Spotify track URLs to a playable page link.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::MfetchConfig;

/// Best match returned by the search API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: Option<String>,
    pub link: String,
    /// Duration as reported by the API (seconds or a display string).
    #[serde(default)]
    pub duration: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct SearchClient {
    endpoint: String,
    timeout: Duration,
}

impl SearchClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn from_config(cfg: &MfetchConfig) -> Self {
        Self::new(
            cfg.search_api_url.clone(),
            Duration::from_secs(cfg.search_timeout_secs),
        )
    }

    /// Looks up `title` and returns the best hit.
    pub fn search(&self, title: &str) -> Result<SearchHit> {
        let url = query_url(&self.endpoint, title)?;
        tracing::debug!(%url, "searching");
        let (status, body) = self.get(&url)?;
        parse_response(status, &body)
    }

    /// Spotify URLs are replaced by the link the search API maps them to;
    /// anything else is returned unchanged.
    pub fn resolve_spotify(&self, url: &str) -> Result<String> {
        if !url.contains("spotify.com") {
            return Ok(url.to_string());
        }
        let hit = self
            .search(url)
            .with_context(|| format!("resolve Spotify link {}", url))?;
        tracing::info!(spotify = url, link = %hit.link, "resolved Spotify link");
        Ok(hit.link)
    }

    fn get(&self, url: &str) -> Result<(u32, Vec<u8>)> {
        let mut body = Vec::new();
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.timeout(self.timeout)?;
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer
                .perform()
                .with_context(|| format!("GET {}", url))?;
        }
        let status = easy.response_code()?;
        Ok((status, body))
    }
}

fn query_url(endpoint: &str, title: &str) -> Result<String> {
    let url = url::Url::parse_with_params(endpoint, &[("title", title)])
        .with_context(|| format!("invalid search endpoint {}", endpoint))?;
    Ok(url.to_string())
}

fn parse_response(status: u32, body: &[u8]) -> Result<SearchHit> {
    if status != 200 {
        bail!("failed to fetch search results (HTTP {})", status);
    }
    let value: serde_json::Value =
        serde_json::from_slice(body).context("search API returned invalid JSON")?;
    let has_link = value
        .get("link")
        .and_then(|l| l.as_str())
        .is_some_and(|l| !l.is_empty());
    if !has_link {
        return Err(anyhow!("no videos found"));
    }
    serde_json::from_value(value).context("unexpected search API response")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_url_encoded() {
        let url = query_url("https://search.example/search", "Daft Punk & friends").unwrap();
        assert_eq!(
            url,
            "https://search.example/search?title=Daft+Punk+%26+friends"
        );
    }

    #[test]
    fn parses_hit() {
        let body = br#"{"title":"Song","link":"https://www.youtube.com/watch?v=abc","duration":213}"#;
        let hit = parse_response(200, body).unwrap();
        assert_eq!(hit.title.as_deref(), Some("Song"));
        assert_eq!(hit.link, "https://www.youtube.com/watch?v=abc");
        assert_eq!(hit.duration, Some(serde_json::json!(213)));
    }

    #[test]
    fn missing_link_is_no_videos_found() {
        let err = parse_response(200, br#"{"title":"x"}"#).unwrap_err();
        assert_eq!(err.to_string(), "no videos found");
        assert!(parse_response(200, b"{}").is_err());
        assert!(parse_response(200, b"null").is_err());
    }

    #[test]
    fn non_200_fails() {
        let err = parse_response(502, b"bad gateway").unwrap_err();
        assert!(err.to_string().contains("failed to fetch search results"));
    }

    #[test]
    fn non_spotify_url_passes_through() {
        // Endpoint is unroutable; a passthrough must not touch the network.
        let client = SearchClient::new("http://127.0.0.1:9/search", Duration::from_millis(50));
        let url = "https://www.youtube.com/watch?v=abc";
        assert_eq!(client.resolve_spotify(url).unwrap(), url);
    }
}
