//! CLI command handlers. Each command is in its own file.

mod cache_size;
mod checksum;
mod download;
mod fetch;
mod generate;
mod probe;
mod search;

pub use cache_size::run_cache_size;
pub use checksum::run_checksum;
pub use download::{run_download, DownloadArgs};
pub use fetch::run_fetch;
pub use generate::{run_completions, run_man};
pub use probe::run_probe;
pub use search::run_search;
