use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stage::PipelineStage;

/// Lifecycle events recorded in the pipeline audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineAction {
    GherkinCreated,
    GherkinValidated,
    GherkinRejected,
    TestQueued,
    TestStarted,
    TestPassed,
    TestFailed,
    EvidenceUploaded,
    EvidenceApproved,
    PipelineCompleted,
    PipelineReset,
}

impl PipelineAction {
    /// Audit action implied by entering `stage`, if any.
    ///
    /// Returning to `awaiting_gherkin` through the table means the scenario
    /// was sent back; operator resets are logged as `PipelineReset` instead.
    pub fn for_stage(stage: PipelineStage) -> Option<Self> {
        match stage {
            PipelineStage::AwaitingGherkin => Some(PipelineAction::GherkinRejected),
            PipelineStage::GherkinValidating => Some(PipelineAction::GherkinCreated),
            PipelineStage::GherkinValidated => Some(PipelineAction::GherkinValidated),
            PipelineStage::QueuedForExecution => Some(PipelineAction::TestQueued),
            PipelineStage::Executing => Some(PipelineAction::TestStarted),
            PipelineStage::Passed => Some(PipelineAction::TestPassed),
            PipelineStage::Failed => Some(PipelineAction::TestFailed),
            PipelineStage::Completed => Some(PipelineAction::PipelineCompleted),
            PipelineStage::AwaitingApproval
            | PipelineStage::Approved
            | PipelineStage::EvidencePending => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfirmationEntry {
    pub timestamp: DateTime<Utc>,
    pub action: PipelineAction,
    pub details: String,
    pub executed_by: String,
}

/// Timestamped audit entry; `executed_by` defaults to `system`.
pub fn create_log_entry(
    action: PipelineAction,
    details: impl Into<String>,
    executed_by: Option<&str>,
) -> PipelineConfirmationEntry {
    create_log_entry_at(action, details, executed_by, Utc::now())
}

pub fn create_log_entry_at(
    action: PipelineAction,
    details: impl Into<String>,
    executed_by: Option<&str>,
    at: DateTime<Utc>,
) -> PipelineConfirmationEntry {
    PipelineConfirmationEntry {
        timestamp: at,
        action,
        details: details.into(),
        executed_by: executed_by.unwrap_or("system").to_string(),
    }
}
