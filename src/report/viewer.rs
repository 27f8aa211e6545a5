use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use super::parser::{parse_sections, ReportSection};
use super::{ReportError, Result, FETCH_FAILED_MESSAGE};
use crate::backend::BackendClient;
use crate::notifications::Notifier;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Formatted,
    Raw,
}

pub fn download_file_name(date: NaiveDate) -> String {
    format!("interview-report-{}.txt", date.format("%Y-%m-%d"))
}

/// The standalone report page: fetch, display and download the report.
pub struct ReportViewer {
    backend: BackendClient,
    notifier: Arc<dyn Notifier>,
    raw: Option<String>,
    sections: Vec<ReportSection>,
    view: View,
    last_error: Option<String>,
}

impl ReportViewer {
    pub fn new(backend: BackendClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            notifier,
            raw: None,
            sections: Vec::new(),
            view: View::default(),
            last_error: None,
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub async fn generate(&mut self) -> Result<&[ReportSection]> {
        info!("🤖 Fetching interview report");
        let outcome = match self.backend.fetch_report().await {
            Ok(response) => match response.report {
                Some(report) => Ok(report),
                None => Err(ReportError::Unavailable(
                    response.message.unwrap_or_else(|| FETCH_FAILED_MESSAGE.to_string()),
                )),
            },
            Err(e) => Err(ReportError::from(e)),
        };

        match outcome {
            Ok(report) => {
                self.sections = parse_sections(&report);
                self.raw = Some(report);
                self.last_error = None;
                info!("✅ Report ready with {} sections", self.sections.len());
                self.notifier.success("✅ Report generated successfully!");
                Ok(self.sections.as_slice())
            }
            Err(e) => {
                error!("Report generation error: {}", e);
                self.last_error = Some(e.to_string());
                self.notifier.error("❌ Failed to generate report");
                Err(e)
            }
        }
    }

    pub fn toggle_view(&mut self, view: View) {
        self.view = view;
    }

    /// Text for the active view.
    pub fn render(&self) -> String {
        let Some(raw) = self.raw.as_deref() else {
            return match &self.last_error {
                Some(message) => format!("Error: {}", message),
                None => "No report generated yet".to_string(),
            };
        };

        match self.view {
            View::Raw => raw.to_string(),
            View::Formatted => {
                let mut out = String::new();
                for section in &self.sections {
                    out.push_str(&section.title);
                    out.push('\n');
                    out.push_str(&"-".repeat(section.title.chars().count()));
                    out.push('\n');
                    for line in section.lines() {
                        out.push_str(line);
                        out.push('\n');
                    }
                    out.push('\n');
                }
                out
            }
        }
    }

    /// Writes the raw report into `dir`. Returns `None`, writing nothing,
    /// when no report has been generated.
    pub fn download(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let Some(raw) = self.raw.as_deref().filter(|raw| !raw.is_empty()) else {
            warn!("No report to download");
            self.notifier.error("❌ No report to download");
            return Ok(None);
        };

        fs::create_dir_all(dir)?;
        let path = dir.join(download_file_name(Utc::now().date_naive()));
        fs::write(&path, raw)?;
        info!("📥 Report saved to {}", path.display());
        self.notifier.success("📥 Report downloaded successfully!");
        Ok(Some(path))
    }
}
