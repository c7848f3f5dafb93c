//! Builder for creating and preallocating the output file.

use std::fs::File;
use std::path::Path;

use super::writer::StorageWriter;
#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Creates the output file; call `preallocate` then `build` to get a
/// `StorageWriter` that worker threads can share.
pub struct StorageWriterBuilder {
    file: File,
    path: std::path::PathBuf,
}

impl StorageWriterBuilder {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(StorageWriterBuilder {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Reserve `size` bytes so every segment offset is valid before the first
    /// write. On Unix tries `posix_fallocate`; falls back to `set_len`.
    pub fn preallocate(&mut self, size: u64) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            let fd = self.file.as_raw_fd();
            let r = unsafe { libc::posix_fallocate(fd, 0, size as libc::off_t) };
            if r == 0 {
                return Ok(());
            }
            tracing::debug!(errno = r, "posix_fallocate failed, falling back to set_len");
        }
        self.file.set_len(size)
    }

    pub fn build(self) -> StorageWriter {
        StorageWriter::from_file_and_path(self.file, self.path)
    }
}
