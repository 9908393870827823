//! File Controller Error Types
//!
//! Every save or fetch resolves to a value, a cancellation, or one of these
//! failures.

use std::io;
use std::path::PathBuf;

use crate::rest::RestError;

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// The caller's cancellation token was observed at a checkpoint
    #[error("Operation cancelled")]
    Cancelled,

    /// Upload command or download request failed
    #[error(transparent)]
    Transport(RestError),

    /// Downloaded data could not be written to the cache
    #[error("Failed to write cache file: {0}")]
    Cache(#[from] io::Error),

    /// The cache directory could not be created when building the controller
    #[error("Failed to create cache directory {}: {source}", .path.display())]
    CacheDir { path: PathBuf, source: io::Error },

    /// Fetch of a file that has neither a remote URL nor a cached copy
    #[error("File '{name}' has not been uploaded")]
    NotUploaded { name: String },
}

impl FileError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FileError::Cancelled)
    }
}

impl From<RestError> for FileError {
    fn from(e: RestError) -> Self {
        match e {
            RestError::Cancelled => FileError::Cancelled,
            other => FileError::Transport(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_transport_error_is_cancellation() {
        assert!(FileError::from(RestError::Cancelled).is_cancelled());
        assert!(matches!(
            FileError::from(RestError::Timeout),
            FileError::Transport(RestError::Timeout)
        ));
    }

    #[test]
    fn test_transport_error_message_is_unchanged() {
        let err = FileError::from(RestError::Server(502, "bad gateway".into()));
        assert_eq!(err.to_string(), "Server error (502): bad gateway");
    }

    #[test]
    fn test_cache_dir_error_names_directory() {
        let err = FileError::CacheDir {
            path: PathBuf::from("/var/cache/cloudfile"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = err.to_string();
        assert!(message.starts_with("Failed to create cache directory /var/cache/cloudfile"));
        assert!(!message.contains("write cache file"));
    }
}
