//! Local disk cache for file content
//!
//! One cached file per file name, written atomically.

pub mod file_cache;

pub use file_cache::FileCache;
