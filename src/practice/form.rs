use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::backend::JobInfo;

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z\s]+$").expect("name pattern is valid"));
static SKILLS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\s,+#.-]+$").expect("skills pattern is valid"));

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const ROLE_MESSAGE: &str = "Please enter a valid job role (at least 2 characters)";
pub const NAME_MESSAGE: &str = "Name should only contain letters and spaces";
pub const SKILLS_MESSAGE: &str = "Skills should contain only letters, numbers, and common symbols";

/// The inputs of the practice-setup form, identified by their element ids.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Name,
    Role,
    Company,
    JobDescription,
    Skills,
    ExperienceLevel,
    InterviewType,
}

impl FormField {
    pub const ALL: [FormField; 7] = [
        FormField::Name,
        FormField::Role,
        FormField::Company,
        FormField::JobDescription,
        FormField::Skills,
        FormField::ExperienceLevel,
        FormField::InterviewType,
    ];

    pub fn id(self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Role => "role",
            FormField::Company => "company",
            FormField::JobDescription => "jobDescription",
            FormField::Skills => "skills",
            FormField::ExperienceLevel => "experienceLevel",
            FormField::InterviewType => "interviewType",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.id() == id)
    }

    pub fn required(self) -> bool {
        matches!(self, FormField::Role)
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Trimmed view of the fields that carry rules beyond "required". Empty
/// optional values are `None` so their patterns are not applied.
#[derive(Debug, Validate)]
struct CandidateProfile {
    #[validate(regex(path = "NAME_PATTERN", message = "Name should only contain letters and spaces"))]
    name: Option<String>,
    #[validate(length(min = 2, message = "Please enter a valid job role (at least 2 characters)"))]
    role: Option<String>,
    #[validate(regex(
        path = "SKILLS_PATTERN",
        message = "Skills should contain only letters, numbers, and common symbols"
    ))]
    skills: Option<String>,
}

/// Current values of the practice-setup form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PracticeForm {
    values: BTreeMap<FormField, String>,
}

impl PracticeForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: FormField, value: &str) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: FormField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: FormField, value: &str) {
        self.values.insert(field, value.to_string());
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// The trimmed value, or `None` when it is blank.
    pub fn trimmed(&self, field: FormField) -> Option<&str> {
        let value = self.get(field).trim();
        (!value.is_empty()).then_some(value)
    }

    /// Whether every required field has a value (the submit button state).
    pub fn submit_ready(&self) -> bool {
        FormField::ALL
            .into_iter()
            .filter(|field| field.required())
            .all(|field| self.trimmed(field).is_some())
    }

    /// Validates every field. A blank required field reports only the
    /// required error; rules run on the trimmed value of non-blank fields.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors: Vec<FieldError> = FormField::ALL
            .into_iter()
            .filter(|field| field.required() && self.trimmed(*field).is_none())
            .map(|field| FieldError {
                field,
                message: REQUIRED_MESSAGE.to_string(),
            })
            .collect();

        let profile = CandidateProfile {
            name: self.trimmed(FormField::Name).map(str::to_string),
            role: self.trimmed(FormField::Role).map(str::to_string),
            skills: self.trimmed(FormField::Skills).map(str::to_string),
        };

        if let Err(rule_errors) = profile.validate() {
            for (name, failures) in rule_errors.field_errors() {
                let Some(field) = FormField::from_id(name) else {
                    continue;
                };
                if errors.iter().any(|e| e.field == field) {
                    continue;
                }
                if let Some(failure) = failures.first() {
                    let message = failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| failure.code.to_string());
                    errors.push(FieldError { field, message });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            errors.sort_by_key(|e| e.field);
            Err(errors)
        }
    }

    /// Inline check for a single field.
    pub fn validate_field(&self, field: FormField) -> Result<(), FieldError> {
        match self.validate() {
            Ok(()) => Ok(()),
            Err(errors) => match errors.into_iter().find(|e| e.field == field) {
                Some(error) => Err(error),
                None => Ok(()),
            },
        }
    }

    /// Normalized payload for `/save-job-info`, with placeholders for the
    /// optional fields.
    pub fn to_job_info(&self) -> JobInfo {
        let details: Vec<String> = [
            (FormField::Skills, "Skills"),
            (FormField::ExperienceLevel, "Experience"),
            (FormField::InterviewType, "Interview Type"),
        ]
        .into_iter()
        .filter_map(|(field, label)| self.trimmed(field).map(|v| format!("{}: {}", label, v)))
        .collect();

        JobInfo {
            candidate_name: self.trimmed(FormField::Name).unwrap_or("Anonymous").to_string(),
            job_role: self.get(FormField::Role).trim().to_string(),
            company_name: self.trimmed(FormField::Company).unwrap_or("Not specified").to_string(),
            job_description: self
                .trimmed(FormField::JobDescription)
                .unwrap_or("No description provided")
                .to_string(),
            other_details: if details.is_empty() {
                "No additional details".to_string()
            } else {
                details.join(" | ")
            },
        }
    }

    /// Flat id → value map of the non-blank fields, values kept verbatim.
    pub fn to_draft(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(field, value)| (field.id().to_string(), value.clone()))
            .collect()
    }

    /// Rebuilds a form from a draft map, ignoring ids it does not know.
    pub fn from_draft(draft: &BTreeMap<String, String>) -> Self {
        let values = draft
            .iter()
            .filter_map(|(id, value)| FormField::from_id(id).map(|field| (field, value.clone())))
            .collect();
        Self { values }
    }
}
