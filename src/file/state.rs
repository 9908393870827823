//! File descriptor
//!
//! `FileState` is an immutable description of a remote file. Updated copies
//! are produced through `FileStateBuilder`.

use serde::{Deserialize, Serialize};

/// Content type used when none is given
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Name, remote URL and content type of a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileState {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    mime_type: String,
}

impl FileState {
    pub fn builder(name: impl Into<String>) -> FileStateBuilder {
        FileStateBuilder {
            name: name.into(),
            url: None,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
        }
    }

    /// Start a modified copy of this state
    pub fn to_builder(&self) -> FileStateBuilder {
        FileStateBuilder {
            name: self.name.clone(),
            url: self.url.clone(),
            mime_type: self.mime_type.clone(),
        }
    }

    /// File name, also the cache key
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remote URL, present once the file has been uploaded
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Whether the content still has to be uploaded
    pub fn is_dirty(&self) -> bool {
        self.url().is_none()
    }
}

#[derive(Debug, Clone)]
pub struct FileStateBuilder {
    name: String,
    url: Option<String>,
    mime_type: String,
}

impl FileStateBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the remote URL. An empty string clears it.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.url = if url.is_empty() { None } else { Some(url) };
        self
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn build(self) -> FileState {
        FileState {
            name: self.name,
            url: self.url,
            mime_type: self.mime_type,
        }
    }
}
