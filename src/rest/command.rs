//! File Commands
//!
//! `RestFileCommand` uploads a payload to the REST file endpoint and
//! `BinaryRequest` fetches raw bytes from a file URL.

use bytes::Bytes;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::HttpTransport;
use super::errors::RestError;
use super::types::{HttpRequest, Method, ProgressCallback, UploadResult};
use crate::config::RestEndpoint;

/// Maximum number of retries for retryable errors
pub const MAX_RETRIES: u32 = 3;

/// Delay before each retry
const BACKOFF_MS: [u64; 3] = [500, 1000, 2000];

/// Upload payload source
#[derive(Debug, Clone)]
pub enum Payload {
    /// In-memory bytes, shared rather than copied between attempts
    Bytes(Bytes),
    /// Existing local file, read when the command executes
    File(PathBuf),
}

impl Payload {
    async fn read(&self) -> Result<Bytes, RestError> {
        match self {
            Payload::Bytes(data) => Ok(data.clone()),
            Payload::File(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
        }
    }
}

/// Upload command for the REST file endpoint
#[derive(Debug, Clone)]
pub struct RestFileCommand {
    endpoint: RestEndpoint,
    file_name: String,
    payload: Payload,
    content_type: String,
    session_token: Option<String>,
    max_retries: u32,
}

/// Builder for [`RestFileCommand`]
#[derive(Debug, Default)]
pub struct RestFileCommandBuilder {
    endpoint: Option<RestEndpoint>,
    file_name: Option<String>,
    payload: Option<Payload>,
    content_type: Option<String>,
    session_token: Option<String>,
}

impl RestFileCommandBuilder {
    pub fn endpoint(mut self, endpoint: RestEndpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn data(self, data: impl Into<Bytes>) -> Self {
        self.payload(Payload::Bytes(data.into()))
    }

    pub fn file(self, path: impl Into<PathBuf>) -> Self {
        self.payload(Payload::File(path.into()))
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn session_token(mut self, token: Option<impl Into<String>>) -> Self {
        self.session_token = token.map(Into::into);
        self
    }

    /// Finish the command. Endpoint, name and payload are required.
    pub fn build(self) -> Result<RestFileCommand, RestError> {
        let missing = |field: &str| RestError::Request(format!("File command is missing {}", field));

        Ok(RestFileCommand {
            endpoint: self.endpoint.ok_or_else(|| missing("an endpoint"))?,
            file_name: self.file_name.ok_or_else(|| missing("a file name"))?,
            payload: self.payload.ok_or_else(|| missing("a payload"))?,
            content_type: self
                .content_type
                .unwrap_or_else(|| crate::file::DEFAULT_MIME_TYPE.to_string()),
            session_token: self.session_token,
            max_retries: 0,
        })
    }
}

impl RestFileCommand {
    pub fn builder() -> RestFileCommandBuilder {
        RestFileCommandBuilder::default()
    }

    /// Retry transient failures with backoff
    pub fn enable_retrying(&mut self) {
        self.max_retries = MAX_RETRIES;
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Build the HTTP request for this upload
    pub fn to_request(&self, body: Bytes) -> HttpRequest {
        let url = format!(
            "{}/files/{}",
            self.endpoint.server_url.trim_end_matches('/'),
            urlencoding::encode(&self.file_name)
        );

        let mut request = HttpRequest::new(Method::Post, url)
            .header("X-Parse-Application-Id", &self.endpoint.application_id)
            .header("Content-Type", &self.content_type);
        if let Some(client_key) = &self.endpoint.client_key {
            request = request.header("X-Parse-Client-Key", client_key);
        }
        if let Some(token) = &self.session_token {
            request = request.header("X-Parse-Session-Token", token);
        }
        request.body(body)
    }

    /// Execute the upload, retrying transient failures when enabled
    ///
    /// Cancellation is polled before each attempt and interrupts backoff
    /// sleeps; an attempt already in flight always runs to completion.
    pub async fn execute(
        &self,
        transport: &dyn HttpTransport,
        upload_progress: Option<&ProgressCallback>,
        cancellation: Option<&CancellationToken>,
    ) -> Result<UploadResult, RestError> {
        let body = self.payload.read().await?;

        for attempt in 0..=self.max_retries {
            if cancellation.is_some_and(|c| c.is_cancelled()) {
                return Err(RestError::Cancelled);
            }

            let request = self.to_request(body.clone());
            let err = match transport.execute(request, upload_progress, None).await {
                Ok(response) => return self.parse_result(response.body),
                Err(e) => e,
            };

            if !err.is_retryable() || attempt == self.max_retries {
                return Err(err);
            }

            let delay = BACKOFF_MS
                .get(attempt as usize)
                .copied()
                .unwrap_or(2000);
            warn!(
                file = %self.file_name,
                attempt = attempt + 1,
                max = self.max_retries,
                delay_ms = delay,
                error = %err,
                "Retrying file upload"
            );

            let sleep = tokio::time::sleep(Duration::from_millis(delay));
            match cancellation {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => return Err(RestError::Cancelled),
                        _ = sleep => {}
                    }
                }
                None => sleep.await,
            }
        }

        unreachable!()
    }

    fn parse_result(&self, body: Option<Vec<u8>>) -> Result<UploadResult, RestError> {
        let body = body.ok_or_else(|| {
            RestError::InvalidResponse("Upload response had no body".to_string())
        })?;
        let result: UploadResult = serde_json::from_slice(&body)
            .map_err(|e| RestError::InvalidResponse(format!("Bad upload response: {}", e)))?;

        info!(
            requested = %self.file_name,
            name = %result.name,
            url = %result.url,
            "File uploaded"
        );
        Ok(result)
    }
}

/// Direct binary request against a file URL
#[derive(Debug, Clone)]
pub struct BinaryRequest {
    method: Method,
    url: String,
}

impl BinaryRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }

    /// Execute the request and return the raw body, `None` if the server sent none
    pub async fn execute(
        &self,
        transport: &dyn HttpTransport,
        download_progress: Option<&ProgressCallback>,
        cancellation: Option<&CancellationToken>,
    ) -> Result<Option<Vec<u8>>, RestError> {
        if cancellation.is_some_and(|c| c.is_cancelled()) {
            return Err(RestError::Cancelled);
        }

        let request = HttpRequest::new(self.method, self.url.clone());
        let response = transport.execute(request, None, download_progress).await?;

        debug!(
            url = %self.url,
            size = response.body.as_ref().map(Vec::len),
            "Binary request completed"
        );
        Ok(response.body)
    }
}
