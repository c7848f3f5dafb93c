//! Output file lifecycle.
//!
//! The file is created at its final name and preallocated to the full
//! resource size, then shared by all segment workers for offset writes
//! (pwrite on Unix, seek_write on Windows).

mod builder;
mod writer;

pub use builder::StorageWriterBuilder;
pub use writer::StorageWriter;
