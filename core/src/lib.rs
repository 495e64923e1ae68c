//! Async client for the video generation backend.
//!
//! # Overview
//! `VideoClient` exposes one method per backend route: health check, submit
//! a generation job, list tasks, fetch a task, download the rendered video and
//! delete a task. Each method issues exactly one HTTP call and hands back the
//! transport's response or error untouched.
//!
//! # Design
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`);
//!   `build_*` methods expose exactly what each operation sends.
//! - `HttpClient` is the configured instance (base URL, timeout, default
//!   headers) and runs `Interceptor`s around every call. Interceptors observe
//!   and never modify.
//! - `Transport` is the I/O seam; `ReqwestTransport` is the default.
//! - No global client exists. The application builds a `ClientConfig` and
//!   owns the resulting `VideoClient`.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod http_client;
pub mod interceptor;
pub mod models;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::VideoClient;
pub use config::ClientConfig;
pub use error::{ApiError, BoxError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ResponseType};
pub use http_client::HttpClient;
pub use interceptor::{Interceptor, LoggingInterceptor};
pub use models::{
    Envelope, GenerateAccepted, GenerateOptions, GenerateRequest, Health, Step, StepStatus, Task,
    TaskInput, TaskList, TaskResult, TaskStatus,
};
pub use transport::{ReqwestTransport, Transport};
