//! File Controller
//!
//! Saves file content to the server and fetches it back on demand. Both
//! directions go through the local `FileCache`, so content that was uploaded
//! or downloaded once is served from disk afterwards.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::errors::FileError;
use super::state::FileState;
use crate::cache::FileCache;
use crate::config::{ClientConfig, RestEndpoint};
use crate::rest::{BinaryRequest, Method, Payload, ProgressCallback, RestFileCommand, TransportProvider};

pub struct FileController {
    /// Primary transport for uploads, lazily built secondary for downloads
    transports: TransportProvider,
    /// Upload target
    endpoint: RestEndpoint,
    cache: FileCache,
}

impl FileController {
    pub fn new(transports: TransportProvider, endpoint: RestEndpoint, cache: FileCache) -> Self {
        Self {
            transports,
            endpoint,
            cache,
        }
    }

    /// Build a controller with reqwest transports and an existing cache directory
    pub fn from_config(config: &ClientConfig) -> Result<Self, FileError> {
        let transports = TransportProvider::from_config(config)?;
        let cache = FileCache::with_dir(&config.cache_dir).map_err(|source| FileError::CacheDir {
            path: config.cache_dir.clone(),
            source,
        })?;

        Ok(Self::new(transports, config.endpoint.clone(), cache))
    }

    pub fn transports(&self) -> &TransportProvider {
        &self.transports
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    pub fn cache_file_for(&self, state: &FileState) -> PathBuf {
        self.cache.cache_file_for(state)
    }

    pub fn is_data_available(&self, state: &FileState) -> bool {
        self.cache.is_available(state)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Upload in-memory bytes and cache them under the server-assigned name
    ///
    /// Returns `state` unchanged if it already has a URL.
    pub async fn save_bytes(
        &self,
        state: &FileState,
        data: impl Into<Bytes>,
        session_token: Option<&str>,
        upload_progress: Option<&ProgressCallback>,
        cancellation: Option<&CancellationToken>,
    ) -> Result<FileState, FileError> {
        self.save(
            state,
            Payload::Bytes(data.into()),
            session_token,
            upload_progress,
            cancellation,
        )
        .await
    }

    /// Upload an existing local file and copy it into the cache
    ///
    /// Returns `state` unchanged if it already has a URL.
    pub async fn save_file(
        &self,
        state: &FileState,
        file: &Path,
        session_token: Option<&str>,
        upload_progress: Option<&ProgressCallback>,
        cancellation: Option<&CancellationToken>,
    ) -> Result<FileState, FileError> {
        self.save(
            state,
            Payload::File(file.to_path_buf()),
            session_token,
            upload_progress,
            cancellation,
        )
        .await
    }

    async fn save(
        &self,
        state: &FileState,
        payload: Payload,
        session_token: Option<&str>,
        upload_progress: Option<&ProgressCallback>,
        cancellation: Option<&CancellationToken>,
    ) -> Result<FileState, FileError> {
        if !state.is_dirty() {
            debug!(name = %state.name(), "File already uploaded, nothing to save");
            return Ok(state.clone());
        }
        if is_cancelled(cancellation) {
            return Err(FileError::Cancelled);
        }

        let mut command = RestFileCommand::builder()
            .endpoint(self.endpoint.clone())
            .file_name(state.name())
            .payload(payload.clone())
            .content_type(state.mime_type())
            .session_token(session_token)
            .build()?;
        command.enable_retrying();

        let result = command
            .execute(self.transports.primary().as_ref(), upload_progress, cancellation)
            .await?;

        let saved = state.to_builder().name(result.name).url(result.url).build();
        self.store_uploaded(&saved, payload).await;

        Ok(saved)
    }

    /// Put uploaded content in the cache. Failures are logged and dropped.
    async fn store_uploaded(&self, state: &FileState, payload: Payload) {
        let cache = self.cache.clone();
        let target = cache.cache_file_for(state);

        let stored = run_blocking(move || match &payload {
            Payload::Bytes(data) => cache.write_bytes(&target, data),
            Payload::File(source) => cache.copy_file(source, &target),
        })
        .await;

        if let Err(e) = stored {
            warn!(name = %state.name(), error = %e, "Failed to cache uploaded file");
        }
    }

    /// Get a local path holding the content of `state`, downloading it on a cache miss
    ///
    /// `session_token` is not needed by the download itself.
    pub async fn fetch(
        &self,
        state: &FileState,
        _session_token: Option<&str>,
        download_progress: Option<&ProgressCallback>,
        cancellation: Option<&CancellationToken>,
    ) -> Result<PathBuf, FileError> {
        if is_cancelled(cancellation) {
            return Err(FileError::Cancelled);
        }

        let file = self.cache.cache_file_for(state);
        let lookup = file.clone();
        if run_blocking(move || Ok(lookup.exists())).await? {
            debug!(name = %state.name(), "File cache HIT");
            return Ok(file);
        }
        if is_cancelled(cancellation) {
            return Err(FileError::Cancelled);
        }

        let url = state.url().ok_or_else(|| FileError::NotUploaded {
            name: state.name().to_string(),
        })?;
        debug!(name = %state.name(), url = url, "File cache MISS, downloading");

        let transport = self.transports.secondary()?;
        let data = BinaryRequest::new(Method::Get, url)
            .execute(transport.as_ref(), download_progress, cancellation)
            .await?;

        // Cancelled while downloading: drop the data instead of caching it
        if is_cancelled(cancellation) {
            return Err(FileError::Cancelled);
        }

        if let Some(data) = data {
            let size = data.len();
            let cache = self.cache.clone();
            let target = file.clone();
            run_blocking(move || cache.write_bytes(&target, &data)).await?;
            info!(name = %state.name(), size = size, "Downloaded file");
        }

        Ok(file)
    }
}

fn is_cancelled(cancellation: Option<&CancellationToken>) -> bool {
    cancellation.is_some_and(|c| c.is_cancelled())
}

/// Run blocking filesystem work off the async workers
async fn run_blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(io::Error::other)?
}
