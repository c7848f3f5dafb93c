pub mod config;
pub mod logging;

// Fetch core
pub mod downloader;
pub mod error;
pub mod fetch_head;
pub mod fetcher;
pub mod mirror;
pub mod progress;
pub mod retry;
pub mod segmenter;
pub mod storage;
pub mod url_model;

// Media pipeline
pub mod cache;
pub mod checksum;
pub mod media;
pub mod pipeline;
pub mod resolver;
pub mod search;

pub use error::FetchError;
pub use fetcher::Fetcher;
pub use media::MediaKind;
pub use pipeline::{MediaRequest, Pipeline};
