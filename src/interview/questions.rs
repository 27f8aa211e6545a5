use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;

/// How many sample questions are shown when the backend is unavailable.
pub const SAMPLE_QUESTION_COUNT: usize = 5;

pub const TECHNICAL_SAMPLES: [&str; 5] = [
    "Explain the difference between let, const, and var in JavaScript.",
    "What is closure in JavaScript and how would you use it?",
    "Describe the event loop in JavaScript and how it handles asynchronous operations.",
    "What are the differences between == and === in JavaScript?",
    "Explain how prototypal inheritance works in JavaScript.",
];

pub const BEHAVIORAL_SAMPLES: [&str; 5] = [
    "Tell me about a challenging project you worked on and how you overcame obstacles.",
    "Describe a time when you had to work with a difficult team member.",
    "How do you handle tight deadlines and pressure?",
    "Tell me about a time you made a mistake and how you handled it.",
    "Describe your approach to learning new technologies.",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuestionCategory {
    Technical,
    Behavioral,
    Mixed,
    /// Any other category the backend understands; samples use the mixed pool.
    Other(String),
}

impl QuestionCategory {
    pub fn as_str(&self) -> &str {
        match self {
            QuestionCategory::Technical => "technical",
            QuestionCategory::Behavioral => "behavioral",
            QuestionCategory::Mixed => "mixed",
            QuestionCategory::Other(name) => name.as_str(),
        }
    }

    /// The local question pool used when the backend cannot be reached.
    pub fn sample_pool(&self) -> Vec<&'static str> {
        match self {
            QuestionCategory::Technical => TECHNICAL_SAMPLES.to_vec(),
            QuestionCategory::Behavioral => BEHAVIORAL_SAMPLES.to_vec(),
            QuestionCategory::Mixed | QuestionCategory::Other(_) => TECHNICAL_SAMPLES[..3]
                .iter()
                .chain(BEHAVIORAL_SAMPLES[..2].iter())
                .copied()
                .collect(),
        }
    }
}

impl FromStr for QuestionCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "technical" => QuestionCategory::Technical,
            "behavioral" => QuestionCategory::Behavioral,
            "mixed" => QuestionCategory::Mixed,
            _ => QuestionCategory::Other(s.trim().to_string()),
        })
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shuffled sample questions for `category`, at most `SAMPLE_QUESTION_COUNT`.
pub fn sample_questions<R: Rng + ?Sized>(category: &QuestionCategory, rng: &mut R) -> Vec<String> {
    let mut pool = category.sample_pool();
    pool.shuffle(rng);
    pool.into_iter()
        .take(SAMPLE_QUESTION_COUNT)
        .map(str::to_string)
        .collect()
}
