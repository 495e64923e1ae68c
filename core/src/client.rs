//! The video generation API facade.
//!
//! # Design
//! `VideoClient` owns two `HttpClient`s. `api` is the configured one: base
//! `origin + /api`, the configured timeout, JSON content type and logging.
//! `root` targets the service root with no timeout and no default headers
//! and is used only for `/health`, which the backend serves outside `/api`.
//!
//! Each operation is split into a `build_*` method that produces the
//! `HttpRequest` and an async method that executes it and returns the raw
//! `HttpResponse`. `parse_*` helpers decode the backend's envelope for callers
//! that want typed data.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, ResponseType};
use crate::http_client::HttpClient;
use crate::interceptor::{Interceptor, LoggingInterceptor};
use crate::models::{Envelope, GenerateAccepted, Health, Task, TaskList};
use crate::transport::{ReqwestTransport, Transport};

pub struct VideoClient<T = ReqwestTransport> {
    api: HttpClient<T>,
    root: HttpClient<T>,
}

impl VideoClient<ReqwestTransport> {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::with_transport(config, ReqwestTransport::new()?)
    }
}

impl<T: Transport + Clone> VideoClient<T> {
    /// Build a client over any transport. Both internal clients share it.
    pub fn with_transport(config: &ClientConfig, transport: T) -> Result<Self, ApiError> {
        config.validate()?;

        let logging: Arc<dyn Interceptor> = Arc::new(LoggingInterceptor);
        let api = HttpClient::new(&config.api_url(), transport.clone())
            .with_timeout(config.timeout)
            .with_default_headers(config.default_headers.clone())
            .with_interceptor(logging.clone());
        let root = HttpClient::new(&config.root_url(), transport).with_interceptor(logging);

        debug!(
            api = api.base_url(),
            root = root.base_url(),
            timeout = ?config.timeout,
            "video client configured"
        );
        Ok(Self { api, root })
    }
}

impl<T: Transport> VideoClient<T> {
    /// Attach another interceptor to both the `/api` and the root client.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.api = self.api.with_interceptor(interceptor.clone());
        self.root = self.root.with_interceptor(interceptor);
        self
    }

    pub fn api(&self) -> &HttpClient<T> {
        &self.api
    }

    pub fn root(&self) -> &HttpClient<T> {
        &self.root
    }

    // --- request builders ---

    pub fn build_check_health(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, "/health")
    }

    /// `data` is sent as-is; its shape belongs to the backend contract.
    pub fn build_generate_video<B>(&self, data: &B) -> Result<HttpRequest, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_string(data).map_err(ApiError::Serialization)?;
        Ok(HttpRequest::new(HttpMethod::Post, "/generate").with_body(body))
    }

    pub fn build_get_tasks(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, "/tasks")
    }

    pub fn build_get_task(&self, task_id: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, format!("/tasks/{task_id}"))
    }

    pub fn build_download_video(&self, task_id: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, format!("/download/{task_id}"))
            .with_response_type(ResponseType::Binary)
    }

    pub fn build_delete_task(&self, task_id: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Delete, format!("/tasks/{task_id}"))
    }

    // --- operations ---

    /// `GET /health` at the service root, bypassing `/api`.
    pub async fn check_health(&self) -> Result<HttpResponse, ApiError> {
        self.root.execute(self.build_check_health()).await
    }

    /// `POST /api/generate`.
    pub async fn generate_video<B>(&self, data: &B) -> Result<HttpResponse, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let request = self
            .build_generate_video(data)
            .inspect_err(|err| error!(error = %err, "Request Error"))?;
        self.api.execute(request).await
    }

    /// `GET /api/tasks`.
    pub async fn get_tasks(&self) -> Result<HttpResponse, ApiError> {
        self.api.execute(self.build_get_tasks()).await
    }

    /// `GET /api/tasks/{task_id}`.
    pub async fn get_task(&self, task_id: &str) -> Result<HttpResponse, ApiError> {
        self.api.execute(self.build_get_task(task_id)).await
    }

    /// `GET /api/download/{task_id}`; the body is left as raw bytes.
    pub async fn download_video(&self, task_id: &str) -> Result<HttpResponse, ApiError> {
        self.api.execute(self.build_download_video(task_id)).await
    }

    /// `DELETE /api/tasks/{task_id}`.
    pub async fn delete_task(&self, task_id: &str) -> Result<HttpResponse, ApiError> {
        self.api.execute(self.build_delete_task(task_id)).await
    }

    // --- typed decoding ---

    pub fn parse_health(&self, response: &HttpResponse) -> Result<Health, ApiError> {
        response.json()
    }

    pub fn parse_generate(&self, response: &HttpResponse) -> Result<GenerateAccepted, ApiError> {
        envelope_data(response)
    }

    pub fn parse_tasks(&self, response: &HttpResponse) -> Result<TaskList, ApiError> {
        envelope_data(response)
    }

    pub fn parse_task(&self, response: &HttpResponse) -> Result<Task, ApiError> {
        envelope_data(response)
    }

    /// The server's confirmation message.
    pub fn parse_delete(&self, response: &HttpResponse) -> Result<String, ApiError> {
        let envelope: Envelope<serde_json::Value> = response.json()?;
        Ok(envelope.message)
    }
}

/// Unwrap `Envelope::data`, treating a missing payload as a decode failure.
fn envelope_data<D: DeserializeOwned>(response: &HttpResponse) -> Result<D, ApiError> {
    use serde::de::Error as _;

    let envelope: Envelope<D> = response.json()?;
    envelope.data.ok_or_else(|| {
        ApiError::Deserialization(serde_json::Error::custom("response envelope has no data"))
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::{GenerateRequest, TaskStatus};
    use crate::testing::{json_response, RecordingInterceptor, RecordingTransport};

    const ORIGIN: &str = "http://localhost:8080";

    fn client() -> (VideoClient<RecordingTransport>, RecordingTransport) {
        let transport = RecordingTransport::new();
        let client =
            VideoClient::with_transport(&ClientConfig::new(ORIGIN), transport.clone()).unwrap();
        (client, transport)
    }

    fn last_request(transport: &RecordingTransport) -> HttpRequest {
        transport.requests().pop().expect("no request recorded")
    }

    #[test]
    fn rejects_invalid_config() {
        let result =
            VideoClient::with_transport(&ClientConfig::new("not a url"), RecordingTransport::new());
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn api_and_root_clients_are_configured_differently() {
        let (client, _) = client();
        assert_eq!(client.api().base_url(), "http://localhost:8080/api");
        assert_eq!(client.api().timeout(), Some(Duration::from_millis(30_000)));
        assert_eq!(client.root().base_url(), ORIGIN);
        assert_eq!(client.root().timeout(), None);
    }

    #[test]
    fn builders_use_relative_paths() {
        let (client, _) = client();
        assert_eq!(client.build_check_health().path, "/health");
        assert_eq!(client.build_get_tasks().path, "/tasks");
        assert_eq!(client.build_get_task("abc").path, "/tasks/abc");
        assert_eq!(client.build_delete_task("abc").method, HttpMethod::Delete);
        let download = client.build_download_video("abc");
        assert_eq!(download.path, "/download/abc");
        assert_eq!(download.response_type, ResponseType::Binary);
    }

    #[tokio::test]
    async fn health_check_bypasses_api_base() {
        let (client, transport) = client();
        client.check_health().await.unwrap();

        let req = last_request(&transport);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:8080/health");
        assert!(req.headers.is_empty());
        assert_eq!(req.timeout, None);
    }

    #[tokio::test]
    async fn health_check_ignores_custom_base_path() {
        let transport = RecordingTransport::new();
        let config = ClientConfig::new(ORIGIN).with_api_base_path("/v2/api");
        let client = VideoClient::with_transport(&config, transport.clone()).unwrap();

        client.check_health().await.unwrap();
        client.get_tasks().await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].path, "http://localhost:8080/health");
        assert_eq!(requests[1].path, "http://localhost:8080/v2/api/tasks");
    }

    #[tokio::test]
    async fn generate_video_posts_body_verbatim() {
        let (client, transport) = client();
        client
            .generate_video(&serde_json::json!({"prompt": "cat"}))
            .await
            .unwrap();

        let req = last_request(&transport);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:8080/api/generate");
        assert_eq!(req.body.as_deref(), Some(r#"{"prompt":"cat"}"#));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.timeout, Some(Duration::from_millis(30_000)));
    }

    #[tokio::test]
    async fn generate_video_accepts_typed_request() {
        let (client, transport) = client();
        client
            .generate_video(&GenerateRequest::new("A cat walks in"))
            .await
            .unwrap();

        let body: serde_json::Value =
            serde_json::from_str(last_request(&transport).body.as_deref().unwrap()).unwrap();
        assert_eq!(body["text"], "A cat walks in");
    }

    #[tokio::test]
    async fn serialization_failure_sends_nothing() {
        struct Unserializable;
        impl Serialize for Unserializable {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("refusing to serialize"))
            }
        }

        let (client, transport) = client();
        let err = client.generate_video(&Unserializable).await.unwrap_err();
        assert!(matches!(err, ApiError::Serialization(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn task_operations_target_expected_routes() {
        let (client, transport) = client();
        client.get_tasks().await.unwrap();
        client.get_task("abc123").await.unwrap();
        client.download_video("abc123").await.unwrap();
        client.delete_task("abc123").await.unwrap();

        let seen: Vec<(HttpMethod, String, ResponseType)> = transport
            .requests()
            .into_iter()
            .map(|r| (r.method, r.path.replace(ORIGIN, ""), r.response_type))
            .collect();
        assert_eq!(
            seen,
            vec![
                (HttpMethod::Get, "/api/tasks".to_string(), ResponseType::Json),
                (HttpMethod::Get, "/api/tasks/abc123".to_string(), ResponseType::Json),
                (HttpMethod::Get, "/api/download/abc123".to_string(), ResponseType::Binary),
                (HttpMethod::Delete, "/api/tasks/abc123".to_string(), ResponseType::Json),
            ]
        );
    }

    #[tokio::test]
    async fn task_id_is_interpolated_without_encoding() {
        let (client, transport) = client();
        client.get_task("a b/c").await.unwrap();
        assert_eq!(last_request(&transport).path, "http://localhost:8080/api/tasks/a b/c");
    }

    #[tokio::test]
    async fn response_is_returned_unaltered() {
        let (client, transport) = client();
        let canned = json_response(200, r#"{"id":"abc123","status":"done"}"#);
        transport.push_response(canned.clone());

        let resp = client.get_task("abc123").await.unwrap();
        assert_eq!(resp, canned);
        let body: serde_json::Value = resp.json().unwrap();
        assert_eq!(body, serde_json::json!({"id": "abc123", "status": "done"}));
    }

    #[tokio::test]
    async fn error_body_is_carried_to_the_caller() {
        let (client, transport) = client();
        transport.push_response(json_response(404, r#"{"error":"not found"}"#));

        let err = client.delete_task("missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.server_payload(), Some(&br#"{"error":"not found"}"#[..]));
        assert_eq!(err.server_message().as_deref(), Some("not found"));
    }

    #[tokio::test]
    async fn extra_interceptors_observe_both_clients() {
        let recorder = Arc::new(RecordingInterceptor::default());
        let (client, transport) = client();
        let client = client.with_interceptor(recorder.clone());
        transport.push_response(json_response(200, r#"{"status":"ok"}"#));
        transport.push_error(ApiError::Network("connection reset".into()));

        client.check_health().await.unwrap();
        let err = client.get_tasks().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));

        assert_eq!(
            recorder.events(),
            vec![
                "request GET http://localhost:8080/health".to_string(),
                "response 200 http://localhost:8080/health".to_string(),
                "request GET http://localhost:8080/api/tasks".to_string(),
                "error http://localhost:8080/api/tasks: network error: connection reset"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn parse_task_unwraps_envelope() {
        let (client, _) = client();
        let resp = json_response(
            200,
            r#"{"code":0,"message":"success","timestamp":"2024-05-01T10:00:00Z","data":{
                "task_id":"abc123","status":"completed","progress":100,
                "current_step":"render_video",
                "steps":[],"input":{"text":"hi","options":{}},
                "result":{"video_path":"/data/abc123/final.mp4","duration":58.2,
                    "resolution":"1920x1080","file_size":1024,"shot_count":12},
                "created_at":"2024-05-01T10:00:00Z","updated_at":"2024-05-01T10:05:00Z"}}"#,
        );
        let task = client.parse_task(&resp).unwrap();
        assert_eq!(task.task_id, "abc123");
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result.unwrap().shot_count, 12);
    }

    #[test]
    fn parse_generate_requires_data() {
        let (client, _) = client();
        let resp = json_response(
            200,
            r#"{"code":0,"message":"success","timestamp":"2024-05-01T10:00:00Z"}"#,
        );
        let err = client.parse_generate(&resp).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_tasks_and_delete() {
        let (client, _) = client();
        let list = json_response(
            200,
            r#"{"code":0,"message":"success","timestamp":"2024-05-01T10:00:00Z",
                "data":{"tasks":[],"total":0}}"#,
        );
        assert_eq!(client.parse_tasks(&list).unwrap().total, 0);

        let deleted = json_response(
            200,
            r#"{"code":0,"message":"Task deleted successfully",
                "timestamp":"2024-05-01T10:00:00Z"}"#,
        );
        assert_eq!(client.parse_delete(&deleted).unwrap(), "Task deleted successfully");
    }

    #[test]
    fn parse_health_reads_plain_body() {
        let (client, _) = client();
        let resp = json_response(200, r#"{"status":"ok","version":"1.0.0","mode":"mock"}"#);
        let health = client.parse_health(&resp).unwrap();
        assert!(health.is_ok());
        assert_eq!(health.mode.as_deref(), Some("mock"));
    }
}
