//! Tree walking - recursive discovery of source files
//!
//! The walker depends only on the [`EntrySource`] port; the filesystem
//! implementation uses `walkdir` and never follows symbolic links.

pub mod infrastructure;
pub mod ports;
mod walker;

pub use infrastructure::{InMemoryEntrySource, OsEntrySource};
pub use ports::{DirEntry, EntrySource};
pub use walker::TreeWalker;
