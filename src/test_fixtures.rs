//! Shared test doubles for client tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::StatusCode;
use serde_json::Value;

use crate::client::{Client, ClientConfig};
use crate::time::{InstantSleeper, Sleeper};
use crate::transport::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Mock HTTP client that returns a queued sequence of responses.
#[derive(Debug, Default)]
pub struct MockClient {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    call_count: AtomicUsize,
}

impl MockClient {
    pub fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Client that answers every queued status with the same JSON body.
    pub fn with_statuses(statuses: &[StatusCode], body: &Value) -> Self {
        Self::new(
            statuses
                .iter()
                .map(|status| Ok(HttpResponse::json(*status, body)))
                .collect(),
        )
    }

    pub fn ok_json(body: &Value) -> Self {
        Self::with_statuses(&[StatusCode::OK], body)
    }

    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn captured_requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

impl HttpClient for MockClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(req);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(HttpError::InvalidRequest("no response queued".to_string())))
    }
}

/// Sleeper that returns immediately and records each requested delay.
#[derive(Debug, Default, Clone)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig::new("p", "ds")
}

/// Client wired to a mock transport that never actually sleeps.
pub fn mock_client(
    config: ClientConfig,
    http: MockClient,
) -> (Client<Arc<MockClient>, InstantSleeper>, Arc<MockClient>) {
    let http = Arc::new(http);
    let client = Client::from_parts(config, Arc::clone(&http), InstantSleeper).unwrap();
    (client, http)
}
