mod keywords;
mod validator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use keywords::{KeywordCategory, KEYWORDS};
pub use validator::{
    count_steps, extract_scenarios, validate_gherkin, Validator, DEFAULT_MAX_SCENARIOS_PER_FILE,
};

/// Category of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorType {
    Syntax,
    Semantic,
    BestPractice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatedBy {
    Manual,
    Automated,
}

/// A single finding. Both errors and warnings use this shape; `severity`
/// matches the list the finding lives in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GherkinValidationError {
    /// 1-based line, or 0/1 for file-level findings
    pub line: usize,
    #[serde(rename = "type")]
    pub kind: ErrorType,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl GherkinValidationError {
    pub(crate) fn error(line: usize, kind: ErrorType, message: impl Into<String>) -> Self {
        Self {
            line,
            kind,
            severity: Severity::Error,
            message: message.into(),
            suggestion: None,
        }
    }

    pub(crate) fn warning(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            kind: ErrorType::BestPractice,
            severity: Severity::Warning,
            message: message.into(),
            suggestion: None,
        }
    }

    pub(crate) fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GherkinMetrics {
    pub scenario_count: usize,
    pub step_count: usize,
    pub has_background: bool,
    pub has_examples: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GherkinValidationResult {
    pub is_valid: bool,
    pub errors: Vec<GherkinValidationError>,
    pub warnings: Vec<GherkinValidationError>,
    pub metrics: GherkinMetrics,
    /// `None` only for empty input
    pub validated_at: Option<DateTime<Utc>>,
    pub validated_by: ValidatedBy,
}
