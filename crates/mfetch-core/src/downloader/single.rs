//! Single-stream HTTP GET into a plain file.
//!
//! Produces the sequential reference copy used to verify a parallel fetch
//! byte for byte.

use anyhow::{Context, Result};
use std::cell::{Cell, RefCell};
use std::io::Write;
use std::path::Path;

use super::SegmentOptions;

/// Downloads `url` with one GET (no Range) into `dest`, returning the number
/// of bytes written. Fails if `expected_len` is given and does not match.
pub fn download_single(
    url: &str,
    dest: &Path,
    expected_len: Option<u64>,
    opts: &SegmentOptions,
) -> Result<u64> {
    let file = std::fs::File::create(dest)
        .with_context(|| format!("failed to create {}", dest.display()))?;
    let out = RefCell::new(std::io::BufWriter::new(file));
    let written = Cell::new(0u64);
    let write_failed: RefCell<Option<std::io::Error>> = RefCell::new(None);

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.buffer_size(opts.chunk_bytes)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(opts.low_speed_time)?;
    easy.timeout(opts.timeout)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match out.borrow_mut().write_all(data) {
            Ok(()) => {
                written.set(written.get() + data.len() as u64);
                Ok(data.len())
            }
            Err(e) => {
                tracing::warn!("single download write failed: {}", e);
                *write_failed.borrow_mut() = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        if let Err(e) = transfer.perform() {
            if let Some(io) = write_failed.borrow_mut().take() {
                return Err(io).context("write to reference file failed");
            }
            return Err(e).context("GET request failed");
        }
    }
    out.into_inner()
        .flush()
        .with_context(|| format!("flush {}", dest.display()))?;

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("GET {} returned HTTP {}", url, code);
    }

    let written = written.get();
    if let Some(exp) = expected_len {
        if written != exp {
            anyhow::bail!("partial transfer: wrote {} of {}", written, exp);
        }
    }
    Ok(written)
}
