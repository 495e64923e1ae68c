//! Fakes shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, ResponseType};
use crate::interceptor::Interceptor;
use crate::transport::Transport;

pub fn json_response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: body.to_owned().into(),
        response_type: ResponseType::Json,
    }
}

#[derive(Default)]
struct Recorded {
    requests: Vec<HttpRequest>,
    outcomes: VecDeque<Result<HttpResponse, ApiError>>,
}

/// Records every request and replays queued outcomes; answers `200 {}` once
/// the queue is empty.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: HttpResponse) {
        self.inner.lock().unwrap().outcomes.push_back(Ok(response));
    }

    pub fn push_error(&self, err: ApiError) {
        self.inner.lock().unwrap().outcomes.push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.inner.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(request.clone());
        inner.outcomes.pop_front().unwrap_or_else(|| {
            let mut response = json_response(200, "{}");
            response.response_type = request.response_type;
            Ok(response)
        })
    }
}

#[derive(Default)]
pub struct RecordingInterceptor {
    events: Mutex<Vec<String>>,
}

impl RecordingInterceptor {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl Interceptor for RecordingInterceptor {
    fn on_request(&self, request: &HttpRequest) {
        self.events
            .lock()
            .unwrap()
            .push(format!("request {} {}", request.method, request.path));
    }

    fn on_response(&self, request: &HttpRequest, response: &HttpResponse) {
        self.events
            .lock()
            .unwrap()
            .push(format!("response {} {}", response.status, request.path));
    }

    fn on_error(&self, request: &HttpRequest, err: &ApiError) {
        self.events
            .lock()
            .unwrap()
            .push(format!("error {}: {err}", request.path));
    }
}
