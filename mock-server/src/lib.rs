use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub const MAX_TEXT_LENGTH: usize = 5000;
/// Background track assigned when a request leaves `bgm` empty.
pub const DEFAULT_BGM: &str = "default.mp3";
pub const STEP_NAMES: [&str; 4] = [
    "parse_script",
    "generate_storyboard",
    "generate_images",
    "render_video",
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Options {
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub duration_target: u32,
    #[serde(default)]
    pub aspect_ratio: String,
    #[serde(default)]
    pub bgm: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Input {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub options: Options,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub progress: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskResult {
    pub video_path: String,
    pub duration: f64,
    pub resolution: String,
    pub file_size: u64,
    pub shot_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub status: String,
    pub progress: u8,
    pub current_step: String,
    pub steps: Vec<Step>,
    pub input: Input,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    fn queued(task_id: String, input: Input) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            status: "queued".to_string(),
            progress: 0,
            current_step: "queued".to_string(),
            steps: STEP_NAMES
                .iter()
                .map(|name| Step {
                    name: name.to_string(),
                    status: "pending".to_string(),
                    progress: 0,
                })
                .collect(),
            input,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Tasks plus the rendered video bytes for completed ones.
#[derive(Debug, Default)]
pub struct Store {
    pub tasks: HashMap<String, Task>,
    pub artifacts: HashMap<String, Vec<u8>>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with_db(Db::default())
}

/// Router over a caller-owned store, so tests can drive task state.
pub fn app_with_db(db: Db) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/generate", post(generate))
        .route("/api/tasks", get(list_tasks))
        .route("/api/tasks/{task_id}", get(get_task).delete(delete_task))
        .route("/api/download/{task_id}", get(download))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_db(listener, Db::default()).await
}

pub async fn run_with_db(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_db(db)).await
}

/// Finish a task the way the render pipeline would: every step completed, a
/// result attached and `video` stored for download. Returns false for an
/// unknown id.
pub async fn complete_task(db: &Db, task_id: &str, video: Vec<u8>) -> bool {
    let mut store = db.write().await;
    let Some(task) = store.tasks.get_mut(task_id) else {
        return false;
    };
    task.status = "completed".to_string();
    task.progress = 100;
    task.current_step = "render_video".to_string();
    for step in &mut task.steps {
        step.status = "completed".to_string();
        step.progress = 100;
    }
    task.result = Some(TaskResult {
        video_path: format!("/data/projects/{task_id}/final.mp4"),
        duration: 60.0,
        resolution: "1920x1080".to_string(),
        file_size: video.len() as u64,
        shot_count: 12,
    });
    task.updated_at = Utc::now();
    store.artifacts.insert(task_id.to_string(), video);
    true
}

fn success<T: Serialize>(message: &str, data: Option<T>) -> Response {
    Json(ApiResponse {
        code: 0,
        message: message.to_string(),
        data,
        error: None,
        timestamp: Utc::now(),
    })
    .into_response()
}

fn failure(status: StatusCode, message: &str, error: Option<String>) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        code: i32::from(status.as_u16()),
        message: message.to_string(),
        data: None,
        error,
        timestamp: Utc::now(),
    };
    (status, Json(body)).into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": "1.0.0",
        "time": Utc::now().to_rfc3339(),
        "mode": "mock",
    }))
}

async fn generate(State(db): State<Db>, payload: Result<Json<Input>, JsonRejection>) -> Response {
    let mut input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => {
            return failure(StatusCode::BAD_REQUEST, "Invalid request", Some(rejection.body_text()))
        }
    };

    if input.text.is_empty() {
        return failure(
            StatusCode::BAD_REQUEST,
            "Text is required",
            Some("text field cannot be empty".to_string()),
        );
    }
    if input.text.len() > MAX_TEXT_LENGTH {
        return failure(
            StatusCode::BAD_REQUEST,
            "Text too long",
            Some(format!(
                "text length exceeds maximum of {MAX_TEXT_LENGTH} characters"
            )),
        );
    }

    if input.options.style.is_empty() {
        input.options.style = "anime".to_string();
    }
    if input.options.duration_target == 0 {
        input.options.duration_target = 60;
    }
    if input.options.aspect_ratio.is_empty() {
        input.options.aspect_ratio = "16:9".to_string();
    }
    if input.options.bgm.is_empty() {
        input.options.bgm = DEFAULT_BGM.to_string();
    }

    let task_id = Uuid::new_v4().to_string();
    let task = Task::queued(task_id.clone(), input);
    db.write().await.tasks.insert(task_id.clone(), task);
    tracing::info!(task_id = %task_id, "task created");

    success(
        "success",
        Some(serde_json::json!({
            "task_id": task_id,
            "status": "processing",
            "estimated_time": 300,
        })),
    )
}

async fn list_tasks(State(db): State<Db>) -> Response {
    let store = db.read().await;
    let mut tasks: Vec<Task> = store.tasks.values().cloned().collect();
    tasks.sort_by_key(|task| task.created_at);
    let total = tasks.len();
    success(
        "success",
        Some(serde_json::json!({ "tasks": tasks, "total": total })),
    )
}

async fn get_task(State(db): State<Db>, Path(task_id): Path<String>) -> Response {
    let store = db.read().await;
    match store.tasks.get(&task_id) {
        Some(task) => success("success", Some(task.clone())),
        None => failure(
            StatusCode::NOT_FOUND,
            "Task not found",
            Some(format!("task {task_id} does not exist")),
        ),
    }
}

async fn download(State(db): State<Db>, Path(task_id): Path<String>) -> Response {
    let store = db.read().await;
    let Some(task) = store.tasks.get(&task_id) else {
        return failure(StatusCode::NOT_FOUND, "Task not found", None);
    };
    let Some(result) = task.result.as_ref().filter(|_| task.status == "completed") else {
        return failure(
            StatusCode::BAD_REQUEST,
            "Video not ready",
            Some(format!("task status is {}", task.status)),
        );
    };
    let Some(video) = store.artifacts.get(&task_id) else {
        return failure(
            StatusCode::NOT_FOUND,
            "Video file not found",
            Some("video file has been deleted or moved".to_string()),
        );
    };

    let filename = result
        .video_path
        .rsplit('/')
        .next()
        .unwrap_or("video.mp4")
        .to_string();
    tracing::info!(task_id = %task_id, bytes = video.len(), "video downloaded");
    (
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        video.clone(),
    )
        .into_response()
}

async fn delete_task(State(db): State<Db>, Path(task_id): Path<String>) -> Response {
    let mut store = db.write().await;
    if store.tasks.remove(&task_id).is_none() {
        return failure(StatusCode::NOT_FOUND, "Task not found", None);
    }
    store.artifacts.remove(&task_id);
    tracing::info!(task_id = %task_id, "task deleted");
    success::<()>("Task deleted successfully", None)
}
