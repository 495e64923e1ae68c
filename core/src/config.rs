//! Client configuration.
//!
//! A `ClientConfig` is built once by whoever wires the application together
//! and handed to `VideoClient::new`. Nothing here is global.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const DEFAULT_API_BASE_PATH: &str = "/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Service root, e.g. `http://localhost:8080`. `/health` lives here.
    pub origin: String,
    #[serde(default = "default_api_base_path")]
    pub api_base_path: String,
    #[serde(rename = "timeout_ms", with = "millis", default = "default_timeout")]
    pub timeout: Duration,
    #[serde(default = "default_headers")]
    pub default_headers: Vec<(String, String)>,
}

fn default_api_base_path() -> String {
    DEFAULT_API_BASE_PATH.to_string()
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

impl ClientConfig {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.to_string(),
            api_base_path: default_api_base_path(),
            timeout: DEFAULT_TIMEOUT,
            default_headers: default_headers(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_api_base_path(mut self, path: &str) -> Self {
        self.api_base_path = path.to_string();
        self
    }

    /// Add a default header, replacing any existing one with the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.default_headers
            .push((name.to_string(), value.to_string()));
        self
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        let origin = self.origin.trim();
        if origin.is_empty() {
            return Err(ApiError::Config("origin cannot be empty".to_string()));
        }
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            return Err(ApiError::Config(format!(
                "origin must use http or https: {origin}"
            )));
        }
        if self.timeout.is_zero() {
            return Err(ApiError::Config("timeout must be greater than zero".to_string()));
        }
        Ok(())
    }

    /// Origin without trailing slashes.
    pub fn root_url(&self) -> String {
        self.origin.trim().trim_end_matches('/').to_string()
    }

    /// Origin joined with the normalised API base path.
    pub fn api_url(&self) -> String {
        let path = self.api_base_path.trim().trim_matches('/');
        if path.is_empty() {
            self.root_url()
        } else {
            format!("{}/{path}", self.root_url())
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis())
            .map_err(|_| S::Error::custom("timeout does not fit in u64 milliseconds"))?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
