use std::time::Duration;

use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::Settings;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Backend returned {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Status { status: u16, message: Option<String> },
    #[error("Invalid backend URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Unexpected backend payload: {0}")]
    UnexpectedPayload(String),
}

pub type Result<T> = std::result::Result<T, BackendError>;

/// Candidate and job metadata, as posted to `/save-job-info`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct JobInfo {
    pub candidate_name: String,
    pub job_role: String,
    pub company_name: String,
    pub job_description: String,
    pub other_details: String,
}

/// The subset of saved job info the session page greets with.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct JobInfoSummary {
    #[serde(default)]
    pub candidate_name: Option<String>,
    #[serde(default)]
    pub job_role: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
}

#[derive(Deserialize)]
struct JobInfoEnvelope {
    #[serde(default)]
    job_info: Option<JobInfoSummary>,
}

/// Metrics sent with the end-of-session report request.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    /// Milliseconds since the session started.
    pub session_duration: u64,
    pub questions_answered: u32,
    pub total_questions: u32,
    pub audio_processed: bool,
    pub video_processed: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ReportResponse {
    #[serde(default)]
    pub report: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct EmotionResponse {
    #[serde(default)]
    emotion: Option<String>,
}

/// HTTP client for the interview analysis backend.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.backend_url, settings.request_timeout())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    pub async fn save_job_info(&self, info: &JobInfo) -> Result<()> {
        info!("📤 Saving job info for {} ({})", info.candidate_name, info.job_role);
        let response = self
            .client
            .post(self.endpoint("/save-job-info")?)
            .json(info)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn get_job_info(&self) -> Result<Option<JobInfoSummary>> {
        let response = self.client.get(self.endpoint("/get-job-info")?).send().await?;
        let envelope: JobInfoEnvelope = check_status(response).await?.json().await?;
        Ok(envelope.job_info)
    }

    /// Questions for `category`. Accepts either `{"questions": [...]}` or a
    /// bare array; anything else yields no questions.
    pub async fn generate_problems(&self, category: &str) -> Result<Vec<String>> {
        info!("🎯 Requesting {} questions", category);
        let response = self
            .client
            .get(self.endpoint("/generate-problems")?)
            .query(&[("category", category)])
            .send()
            .await?;
        let payload: Value = check_status(response).await?.json().await?;

        let list = match &payload {
            Value::Array(_) => Some(&payload),
            Value::Object(map) => map.get("questions"),
            _ => None,
        };
        let questions: Vec<String> = list
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|q| q.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        debug!("Backend returned {} questions", questions.len());
        Ok(questions)
    }

    pub async fn upload_audio(&self, wav: Vec<u8>) -> Result<()> {
        info!("🎙️ Uploading {} bytes of audio", wav.len());
        let part = Part::bytes(wav).file_name("recording.wav").mime_str("audio/wav")?;
        let response = self
            .client
            .post(self.endpoint("/upload")?)
            .multipart(Form::new().part("audio", part))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Uploads one still frame and returns the classified emotion, if any.
    pub async fn analyze_frame(&self, jpeg: Vec<u8>) -> Result<Option<String>> {
        let part = Part::bytes(jpeg).file_name("frame.jpg").mime_str("image/jpeg")?;
        let response = self
            .client
            .post(self.endpoint("/analyze-video")?)
            .multipart(Form::new().part("video", part))
            .send()
            .await?;
        let payload: EmotionResponse = check_status(response).await?.json().await?;
        Ok(payload.emotion.filter(|e| !e.trim().is_empty()))
    }

    pub async fn generate_session_report(&self, metrics: &SessionMetrics) -> Result<Value> {
        info!(
            "📊 Requesting session report ({} ms, {}/{} questions)",
            metrics.session_duration, metrics.questions_answered, metrics.total_questions
        );
        let response = self
            .client
            .post(self.endpoint("/generate-report")?)
            .json(metrics)
            .send()
            .await?;
        let payload: Value = check_status(response).await?.json().await?;
        if !payload.is_object() {
            return Err(BackendError::UnexpectedPayload(format!(
                "report is not an object: {}",
                payload
            )));
        }
        Ok(payload)
    }

    pub async fn fetch_report(&self) -> Result<ReportResponse> {
        let response = self.client.get(self.endpoint("/generate-report")?).send().await?;
        Ok(check_status(response).await?.json().await?)
    }
}

/// Passes 2xx responses through; anything else becomes a `Status` error
/// carrying the payload's `message` when there is one.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| {
            body.get("message")
                .or_else(|| body.get("detail"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });
    warn!("Backend responded {} ({:?})", status, message);
    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}
