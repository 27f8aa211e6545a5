use log::{info, warn};

use super::questions::{sample_questions, QuestionCategory};
use crate::backend::{self, BackendClient};
use crate::config::DegradePolicy;

/// Where a batch of questions came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionSource {
    Backend,
    Samples,
}

#[derive(Clone, Debug)]
pub struct QuestionBatch {
    pub category: QuestionCategory,
    pub questions: Vec<String>,
    pub source: QuestionSource,
}

/// Fetches interview questions, substituting the local samples when the
/// backend is unreachable and the policy allows it.
#[derive(Clone)]
pub struct QuestionEngine {
    backend: BackendClient,
    policy: DegradePolicy,
}

impl QuestionEngine {
    pub fn new(backend: BackendClient, policy: DegradePolicy) -> Self {
        Self { backend, policy }
    }

    pub async fn generate(&self, category: &QuestionCategory) -> backend::Result<QuestionBatch> {
        match self.backend.generate_problems(category.as_str()).await {
            Ok(questions) => {
                info!("✅ {} {} questions from backend", questions.len(), category);
                Ok(QuestionBatch {
                    category: category.clone(),
                    questions,
                    source: QuestionSource::Backend,
                })
            }
            Err(e) if self.policy.allows_synthetic() => {
                warn!("Backend unavailable, using sample questions: {}", e);
                Ok(QuestionBatch {
                    category: category.clone(),
                    questions: sample_questions(category, &mut rand::thread_rng()),
                    source: QuestionSource::Samples,
                })
            }
            Err(e) => Err(e),
        }
    }
}
