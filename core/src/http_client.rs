//! A configured request executor: base URL, timeout, default headers and
//! interceptors around a `Transport`.
//!
//! # Design
//! `execute` is the single path every call takes. It resolves the request,
//! notifies interceptors, sends it, turns non-2xx statuses into
//! `ApiError::Status`, notifies interceptors again and hands back exactly what
//! it got. There is no retry and no recovery here.

use std::sync::Arc;
use std::time::Duration;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::interceptor::Interceptor;
use crate::transport::Transport;

pub struct HttpClient<T> {
    base_url: String,
    timeout: Option<Duration>,
    default_headers: Vec<(String, String)>,
    transport: T,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl<T: Transport> HttpClient<T> {
    /// A client with no timeout, no default headers and no interceptors.
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: None,
            default_headers: Vec::new(),
            transport,
            interceptors: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_default_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.default_headers = headers;
        self
    }

    /// Interceptors run in the order they were added.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Apply base URL, default headers and timeout to a request.
    ///
    /// The path is appended to the base verbatim; any percent-encoding is left
    /// to the transport's URL parser.
    pub fn resolve(&self, mut request: HttpRequest) -> HttpRequest {
        request.path = format!("{}{}", self.base_url, request.path);

        let mut headers: Vec<(String, String)> = self
            .default_headers
            .iter()
            .filter(|(name, _)| request.header(name).is_none())
            .cloned()
            .collect();
        headers.append(&mut request.headers);
        request.headers = headers;

        if request.timeout.is_none() {
            request.timeout = self.timeout;
        }
        request
    }

    /// Send a request and return the transport's outcome unchanged.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let request = self.resolve(request);
        for interceptor in &self.interceptors {
            interceptor.on_request(&request);
        }

        let result = self.transport.send(&request).await.and_then(check_status);

        match &result {
            Ok(response) => {
                for interceptor in &self.interceptors {
                    interceptor.on_response(&request, response);
                }
            }
            Err(err) => {
                for interceptor in &self.interceptors {
                    interceptor.on_error(&request, err);
                }
            }
        }
        result
    }
}

/// Map non-2xx responses to `ApiError::Status`, keeping the whole response.
fn check_status(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }
    Err(ApiError::Status {
        status: response.status,
        response,
    })
}
