//! HTTP Transport
//!
//! The `HttpTransport` trait is the seam between commands and the network.
//! `ReqwestTransport` is the production implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, trace};

use super::errors::RestError;
use super::types::{HttpRequest, HttpResponse, Method, ProgressCallback, ProgressReporter};

/// Default HTTP client timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on the body buffer reserved from a declared Content-Length
const MAX_BODY_PREALLOC: u64 = 8 * 1024 * 1024;

/// Executes HTTP requests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and read the whole response body.
    ///
    /// Non-2xx responses resolve to an error built with `RestError::from_status`.
    async fn execute(
        &self,
        request: HttpRequest,
        upload_progress: Option<&ProgressCallback>,
        download_progress: Option<&ProgressCallback>,
    ) -> Result<HttpResponse, RestError>;
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: Client,
}

impl ReqwestTransport {
    /// Create a transport with the default request timeout
    pub fn new() -> Result<Self, RestError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Create a transport with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, RestError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RestError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        upload_progress: Option<&ProgressCallback>,
        download_progress: Option<&ProgressCallback>,
    ) -> Result<HttpResponse, RestError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self.http_client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut upload = ProgressReporter::new(upload_progress);
        let has_body = request.body.is_some();
        if let Some(body) = request.body {
            upload.report(0);
            builder = builder.body(body);
        }

        let mut response = builder.send().await?;
        if has_body {
            upload.finish();
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RestError::from_status(status.as_u16(), &body));
        }

        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(HttpResponse {
                status: status.as_u16(),
                body: None,
            });
        }

        let total = response.content_length();
        let mut download = ProgressReporter::new(download_progress);
        let mut body = Vec::with_capacity(total.map_or(0, |t| t.min(MAX_BODY_PREALLOC)) as usize);
        download.update(0, total);

        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            trace!(received = body.len(), total = ?total, "Received chunk");
            download.update(body.len() as u64, total);
        }
        download.finish();

        Ok(HttpResponse {
            status: status.as_u16(),
            body: Some(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn local_transport() -> ReqwestTransport {
        ReqwestTransport {
            http_client: Client::builder()
                .no_proxy()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap(),
        }
    }

    /// Accept one connection, answer it with `response` and hang up
    async fn serve_once(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            socket.write_all(response).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}/files/a.bin", addr)
    }

    #[tokio::test]
    async fn test_download_reads_body_and_reports_progress() {
        let url = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello").await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress: ProgressCallback = Arc::new(move |p| sink.lock().unwrap().push(p));

        let response = local_transport()
            .execute(HttpRequest::new(Method::Get, url), None, Some(&progress))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body.as_deref(), Some(&b"hello"[..]));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
    }

    #[tokio::test]
    async fn test_oversized_content_length_fails_without_reserving_it() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 1000000000000000\r\nConnection: close\r\n\r\nhi",
        )
        .await;

        let result = local_transport()
            .execute(HttpRequest::new(Method::Get, url), None, None)
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_error_status_is_mapped() {
        let url = serve_once(
            b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 4\r\nConnection: close\r\n\r\nbusy",
        )
        .await;

        let err = local_transport()
            .execute(HttpRequest::new(Method::Get, url), None, None)
            .await
            .unwrap_err();

        assert_eq!(err, RestError::Server(503, "busy".into()));
    }
}
