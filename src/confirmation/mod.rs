mod entry;
mod generator;
mod report;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use entry::{create_log_entry, create_log_entry_at, PipelineAction, PipelineConfirmationEntry};
pub use generator::{generate_confirmation, generate_confirmation_at};
pub use report::{format_confirmation_log, generate_consolidated_report};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationType {
    Usage,
    Completion,
    Failure,
    Skip,
}

impl ConfirmationType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfirmationType::Usage => "usage",
            ConfirmationType::Completion => "completion",
            ConfirmationType::Failure => "failure",
            ConfirmationType::Skip => "skip",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratedBy {
    System,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceKind {
    Screenshot,
    Video,
    Report,
}

impl EvidenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EvidenceKind::Screenshot => "screenshot",
            EvidenceKind::Video => "video",
            EvidenceKind::Report => "report",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfirmationSummary {
    pub gherkin_validated: bool,
    pub tests_executed: bool,
    pub tests_passed: bool,
    pub evidence_provided: bool,
    /// Milliseconds
    pub total_duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GherkinValidationDetails {
    pub scenario_count: usize,
    pub step_count: usize,
    pub validated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestExecutionDetails {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub passed_scenarios: usize,
    pub failed_scenarios: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceDetails {
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EvidenceKind,
}

/// Sparse detail block: only the populated parts are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfirmationDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gherkin_validation: Option<GherkinValidationDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_execution: Option<TestExecutionDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<EvidenceDetails>,
}

/// Immutable audit record of an item's pipeline journey at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfirmation {
    pub id: Uuid,
    pub row_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ConfirmationType,
    pub summary: PipelineConfirmationSummary,
    pub details: PipelineConfirmationDetails,
    pub message: String,
    pub generated_by: GeneratedBy,
}
