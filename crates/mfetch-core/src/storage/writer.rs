//! Shared offset writer for the output file of one fetch.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(unix)]
use std::os::unix::fs::FileExt;
#[cfg(windows)]
use std::os::windows::fs::FileExt;

/// Handle to a preallocated output file. Cloning shares the same open file;
/// every write names its offset, so workers never touch a shared cursor.
#[derive(Clone)]
pub struct StorageWriter {
    file: Arc<File>,
    path: PathBuf,
}

impl StorageWriter {
    pub(crate) fn from_file_and_path(file: File, path: PathBuf) -> Self {
        Self {
            file: Arc::new(file),
            path,
        }
    }

    /// Write all of `data` starting at `offset`.
    pub fn write_at(&self, offset: u64, data: &[u8]) -> std::io::Result<()> {
        let mut written = 0usize;
        while written < data.len() {
            let n = self.write_once(offset + written as u64, &data[written..])?;
            if n == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    format!("short write: {} of {}", written, data.len()),
                ));
            }
            written += n;
        }
        Ok(())
    }

    #[cfg(unix)]
    fn write_once(&self, offset: u64, data: &[u8]) -> std::io::Result<usize> {
        self.file.write_at(data, offset)
    }

    #[cfg(windows)]
    fn write_once(&self, offset: u64, data: &[u8]) -> std::io::Result<usize> {
        self.file.seek_write(data, offset)
    }

    /// Sync file data to disk.
    pub fn sync(&self) -> std::io::Result<()> {
        self.file.sync_all()
    }

    /// Current on-disk length of the file.
    pub fn len(&self) -> std::io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
