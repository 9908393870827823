//! Request/response types shared by transports, commands and the controller.

use bytes::Bytes;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Receives transfer progress as an integer percentage (0..=100)
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built HTTP request, independent of the client executing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a header value (case-insensitive)
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A successful (2xx) HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Response body; `None` when the server sent no content
    pub body: Option<Vec<u8>>,
}

impl HttpResponse {
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }
}

/// Server reply to a file upload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadResult {
    /// Name assigned by the server (may differ from the requested name)
    pub name: String,
    /// Public URL of the stored file
    pub url: String,
}

/// Forwards progress to a callback, dropping repeated percentages
pub struct ProgressReporter<'a> {
    callback: Option<&'a ProgressCallback>,
    last: Option<u8>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(callback: Option<&'a ProgressCallback>) -> Self {
        Self {
            callback,
            last: None,
        }
    }

    /// Report `done` out of `total` units. Unknown totals report nothing.
    pub fn update(&mut self, done: u64, total: Option<u64>) {
        let Some(total) = total.filter(|t| *t > 0) else {
            return;
        };
        let percent = ((done.min(total) * 100) / total) as u8;
        self.report(percent);
    }

    pub fn report(&mut self, percent: u8) {
        let percent = percent.min(100);
        if self.last == Some(percent) {
            return;
        }
        self.last = Some(percent);
        if let Some(cb) = self.callback {
            cb(percent);
        }
    }

    pub fn finish(&mut self) {
        self.report(100);
    }
}
