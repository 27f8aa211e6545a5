pub mod parser;
pub mod viewer;

pub use parser::*;
pub use viewer::*;

use thiserror::Error;

use crate::backend::BackendError;

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch report.";

#[derive(Error, Debug)]
pub enum ReportError {
    /// The backend answered without a report; carries the message to show.
    #[error("{0}")]
    Unavailable(String),
    #[error(transparent)]
    Backend(BackendError),
    #[error("Could not write report: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BackendError> for ReportError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Status { message, .. } => {
                ReportError::Unavailable(message.unwrap_or_else(|| FETCH_FAILED_MESSAGE.to_string()))
            }
            other => ReportError::Backend(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
