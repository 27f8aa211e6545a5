#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use acenext_lib::config::Settings;
use acenext_lib::notifications::ToastCenter;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// How the fake backend answers.
#[derive(Clone, Debug)]
pub struct FakeConfig {
    pub job_info: Value,
    pub questions: Vec<String>,
    pub emotion: Option<String>,
    pub session_report: Value,
    /// Status and body of `GET /generate-report`.
    pub standalone_report: (u16, Value),
    pub fail_save_job_info: bool,
    pub fail_problems: bool,
    pub fail_upload: bool,
    pub fail_session_report: bool,
    pub save_delay: Duration,
}

impl Default for FakeConfig {
    fn default() -> Self {
        Self {
            job_info: json!({
                "job_info": {
                    "candidate_name": "Jane",
                    "job_role": "Backend Engineer",
                    "company_name": "Acme"
                }
            }),
            questions: (1..=5).map(|i| format!("Backend question {}", i)).collect(),
            emotion: Some("calm".to_string()),
            session_report: json!({ "overallScore": 84, "report": "Strengths:\nClear answers" }),
            standalone_report: (
                200,
                json!({ "report": "Summary:\nSolid session\nStrengths:\nClear answers\nConcise" }),
            ),
            fail_save_job_info: false,
            fail_problems: false,
            fail_upload: false,
            fail_session_report: false,
            save_delay: Duration::ZERO,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Upload {
    pub field: String,
    pub file_name: Option<String>,
    pub size: usize,
}

/// Everything the fake backend has been sent.
#[derive(Default, Debug)]
pub struct Received {
    pub job_info: Vec<Value>,
    pub problem_categories: Vec<String>,
    pub audio: Vec<Upload>,
    pub frames: Vec<Upload>,
    pub session_reports: Vec<Value>,
    pub report_fetches: usize,
}

#[derive(Clone)]
struct AppState {
    config: Arc<Mutex<FakeConfig>>,
    received: Arc<Mutex<Received>>,
}

pub struct FakeBackend {
    pub url: String,
    pub config: Arc<Mutex<FakeConfig>>,
    pub received: Arc<Mutex<Received>>,
    handle: JoinHandle<()>,
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl FakeBackend {
    pub async fn spawn(config: FakeConfig) -> Self {
        let state = AppState {
            config: Arc::new(Mutex::new(config)),
            received: Arc::new(Mutex::new(Received::default())),
        };

        let app = Router::new()
            .route("/save-job-info", post(save_job_info))
            .route("/get-job-info", get(get_job_info))
            .route("/generate-problems", get(generate_problems))
            .route("/upload", post(upload))
            .route("/analyze-video", post(analyze_video))
            .route("/generate-report", get(fetch_report).post(session_report))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url,
            config: state.config,
            received: state.received,
            handle,
        }
    }

    pub fn configure(&self, update: impl FnOnce(&mut FakeConfig)) {
        update(&mut self.config.lock());
    }
}

/// A URL nothing is listening on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Settings with millisecond timings so background work happens quickly.
pub fn fast_settings(backend_url: &str, dir: &Path) -> Settings {
    Settings {
        backend_url: backend_url.to_string(),
        request_timeout_secs: 5,
        frame_interval_ms: 40,
        video_fallback_ms: 60,
        audio_fallback_ms: 30,
        recorder_chunk_ms: 10,
        clock_tick_ms: 20,
        redirect_delay_ms: 5,
        landing_delay_ms: 5,
        tip_delay_ms: 20,
        notification_ms: 4000,
        storage_path: dir.join("local_storage.json"),
        report_dir: dir.join("reports"),
        ..Settings::default()
    }
}

pub fn toasts() -> Arc<ToastCenter> {
    Arc::new(ToastCenter::new(Duration::from_secs(4)))
}

fn failure(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": message })))
}

async fn read_parts(mut multipart: Multipart) -> Vec<Upload> {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.unwrap_or_default();
        parts.push(Upload {
            field: name,
            file_name,
            size: bytes.len(),
        });
    }
    parts
}

async fn save_job_info(State(state): State<AppState>, Json(body): Json<Value>) -> Reply {
    let (delay, fail) = {
        let config = state.config.lock();
        (config.save_delay, config.fail_save_job_info)
    };
    state.received.lock().job_info.push(body);
    tokio::time::sleep(delay).await;
    if fail {
        return Err(failure("could not save job info"));
    }
    Ok(Json(json!({ "message": "saved" })))
}

async fn get_job_info(State(state): State<AppState>) -> Reply {
    Ok(Json(state.config.lock().job_info.clone()))
}

#[derive(Deserialize)]
struct CategoryQuery {
    category: String,
}

async fn generate_problems(State(state): State<AppState>, Query(query): Query<CategoryQuery>) -> Reply {
    state.received.lock().problem_categories.push(query.category);
    let config = state.config.lock();
    if config.fail_problems {
        return Err(failure("question generator offline"));
    }
    Ok(Json(json!({ "questions": config.questions })))
}

async fn upload(State(state): State<AppState>, multipart: Multipart) -> Reply {
    let parts = read_parts(multipart).await;
    state.received.lock().audio.extend(parts);
    if state.config.lock().fail_upload {
        return Err(failure("transcription failed"));
    }
    Ok(Json(json!({ "message": "processed" })))
}

async fn analyze_video(State(state): State<AppState>, multipart: Multipart) -> Reply {
    let parts = read_parts(multipart).await;
    state.received.lock().frames.extend(parts);
    Ok(Json(json!({ "emotion": state.config.lock().emotion })))
}

async fn session_report(State(state): State<AppState>, Json(body): Json<Value>) -> Reply {
    state.received.lock().session_reports.push(body);
    let config = state.config.lock();
    if config.fail_session_report {
        return Err(failure("report generator offline"));
    }
    Ok(Json(config.session_report.clone()))
}

async fn fetch_report(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    state.received.lock().report_fetches += 1;
    let (status, body) = state.config.lock().standalone_report.clone();
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(body),
    )
}
