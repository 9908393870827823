//! Local File Cache
//!
//! Keeps one file per file name directly under the cache directory so that
//! uploaded and downloaded content is not transferred again.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::file::FileState;

/// Local disk cache for file content
#[derive(Debug, Clone)]
pub struct FileCache {
    /// Root directory for cached files
    cache_dir: PathBuf,
}

impl FileCache {
    /// Create a cache rooted at `cache_dir`. The directory is created lazily.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Create a cache and make sure its directory exists
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let cache = Self::new(cache_dir);
        fs::create_dir_all(&cache.cache_dir)?;

        info!(cache_dir = %cache.cache_dir.display(), "File cache initialized");
        Ok(cache)
    }

    /// Location of the cached copy of `state`
    ///
    /// Always a direct child of the cache directory: root, `.` and `..`
    /// components are dropped and nested segments are joined with `_`.
    pub fn cache_file_for(&self, state: &FileState) -> PathBuf {
        self.cache_dir.join(flat_file_name(state.name()))
    }

    /// Whether a cached copy of `state` exists right now
    pub fn is_available(&self, state: &FileState) -> bool {
        self.cache_file_for(state).exists()
    }

    /// Delete everything directly under the cache directory.
    ///
    /// Individual failures are skipped. A missing directory is a no-op.
    pub fn clear(&self) {
        let read_dir = match fs::read_dir(&self.cache_dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                debug!(cache_dir = %self.cache_dir.display(), error = %e, "Nothing to clear");
                return;
            }
        };

        let mut removed = 0usize;
        for entry in read_dir.flatten() {
            if delete_quietly(&entry.path()) {
                removed += 1;
            }
        }

        info!(cache_dir = %self.cache_dir.display(), removed = removed, "Cleared file cache");
    }

    /// Atomically write `data` to `path`
    pub fn write_bytes(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut tmp = self.temp_file_for(path)?;
        tmp.write_all(data)?;
        tmp.persist(path).map_err(|e| e.error)?;

        debug!(local = %path.display(), size = data.len(), "Stored file in cache");
        Ok(())
    }

    /// Atomically copy the file at `src` to `dst`
    pub fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<()> {
        let mut source = fs::File::open(src)?;
        let mut tmp = self.temp_file_for(dst)?;
        let size = io::copy(&mut source, &mut tmp)?;
        tmp.persist(dst).map_err(|e| e.error)?;

        debug!(
            source = %src.display(),
            local = %dst.display(),
            size = size,
            "Copied file into cache"
        );
        Ok(())
    }

    /// Temp file next to `path`, so that persisting it is a rename
    fn temp_file_for(&self, path: &Path) -> io::Result<tempfile::NamedTempFile> {
        let parent = path.parent().unwrap_or(&self.cache_dir);
        fs::create_dir_all(parent)?;
        tempfile::NamedTempFile::new_in(parent)
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

/// Remove a file or directory tree, reporting success instead of failing
fn delete_quietly(path: &Path) -> bool {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Could not delete cache entry");
            false
        }
    }
}

fn flat_file_name(name: &str) -> String {
    let segments: Vec<_> = Path::new(name)
        .components()
        .filter_map(|c| match c {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect();

    if segments.is_empty() {
        "_".to_string()
    } else {
        segments.join("_")
    }
}
