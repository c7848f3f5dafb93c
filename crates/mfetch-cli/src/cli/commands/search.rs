//! `mfetch search` – look up a video by title.

use anyhow::Result;
use mfetch_core::config::MfetchConfig;
use mfetch_core::search::SearchClient;

pub async fn run_search(cfg: &MfetchConfig, title: &str) -> Result<()> {
    let client = SearchClient::from_config(cfg);
    let title = title.to_string();
    let hit = tokio::task::spawn_blocking(move || client.search(&title)).await??;
    println!("title:    {}", hit.title.as_deref().unwrap_or("-"));
    println!("url:      {}", hit.link);
    if let Some(duration) = hit.duration {
        println!("duration: {}", duration);
    }
    Ok(())
}
