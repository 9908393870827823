//! In-memory transport for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::client::HttpTransport;
use super::errors::RestError;
use super::types::{HttpRequest, HttpResponse, ProgressCallback};

type Hook = Box<dyn Fn(&HttpRequest) + Send + Sync>;

/// Replays queued responses and records every request it sees
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, RestError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    calls: AtomicUsize,
    hook: Mutex<Option<Hook>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, response: Result<HttpResponse, RestError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_json(&self, json: serde_json::Value) {
        self.push(Ok(HttpResponse::ok(json.to_string().into_bytes())));
    }

    /// Run `hook` while a request is being executed
    pub fn on_execute(&self, hook: impl Fn(&HttpRequest) + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        upload_progress: Option<&ProgressCallback>,
        download_progress: Option<&ProgressCallback>,
    ) -> Result<HttpResponse, RestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook(&request);
        }
        self.requests.lock().unwrap().push(request);

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RestError::Network("no response queued".to_string())));

        if response.is_ok() {
            for cb in [upload_progress, download_progress].into_iter().flatten() {
                cb(100);
            }
        }
        response
    }
}
