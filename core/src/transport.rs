//! The I/O seam: one request in, one response out.
//!
//! A `Transport` returns responses of every status as data. Deciding what
//! counts as a failure is left to `HttpClient`, so a transport only fails when
//! no response was received at all.

use async_trait::async_trait;
use tracing::trace;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a single round-trip for an already-resolved request.
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Production transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport over a fresh client. Fails when the TLS backend
    /// cannot be initialised.
    pub fn new() -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| ApiError::Config(format!("cannot build http client: {err}")))?;
        Ok(Self { client })
    }

    /// Reuse an existing client (connection pool, proxy settings, TLS roots).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.path);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        // Without a timeout the request waits as long as reqwest's own default allows.
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        trace!(status, bytes = body.len(), "transport round-trip finished");

        Ok(HttpResponse {
            status,
            headers,
            body,
            response_type: request.response_type,
        })
    }
}

/// A request reqwest refuses to build (bad URL, invalid header) never reached
/// the network, so it is reported as a configuration problem.
fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_builder() {
        ApiError::Config(err.to_string())
    } else if err.is_timeout() {
        ApiError::Timeout(Box::new(err))
    } else {
        ApiError::Network(Box::new(err))
    }
}
