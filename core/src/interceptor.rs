//! Observational hooks around every request.
//!
//! Hooks receive shared references only. They can record or log, but the
//! request that goes out and the result that comes back are never theirs to
//! change.

use tracing::{error, info};

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, ResponseType};

pub trait Interceptor: Send + Sync {
    /// Called once the request is fully resolved, right before it is sent.
    fn on_request(&self, _request: &HttpRequest) {}

    /// Called after a 2xx response.
    fn on_response(&self, _request: &HttpRequest, _response: &HttpResponse) {}

    /// Called after a transport failure or a non-2xx response.
    fn on_error(&self, _request: &HttpRequest, _error: &ApiError) {}
}

/// Logs every call through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor;

impl Interceptor for LoggingInterceptor {
    fn on_request(&self, request: &HttpRequest) {
        match &request.body {
            Some(body) => info!(
                method = request.method.as_str(),
                url = %request.path,
                body = %body,
                "API Request"
            ),
            None => info!(method = request.method.as_str(), url = %request.path, "API Request"),
        }
    }

    fn on_response(&self, request: &HttpRequest, response: &HttpResponse) {
        info!(
            url = %request.path,
            status = response.status,
            data = %describe_body(response),
            "API Response"
        );
    }

    fn on_error(&self, request: &HttpRequest, err: &ApiError) {
        error!(url = %request.path, detail = %error_detail(err), "Response Error");
    }
}

/// Payload as it should appear in a log line.
pub(crate) fn describe_body(response: &HttpResponse) -> String {
    match response.response_type {
        ResponseType::Binary => format!("<{} bytes>", response.body.len()),
        ResponseType::Json => response.text(),
    }
}

/// The server's error body when it sent one, else the error message.
pub(crate) fn error_detail(err: &ApiError) -> String {
    match err.server_payload() {
        Some(payload) => String::from_utf8_lossy(payload).into_owned(),
        None => err.to_string(),
    }
}
