use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::QaPipeError;
use crate::stage::PipelineStage;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// One reached stage in an item's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageHistoryEntry {
    pub stage: PipelineStage,
    pub timestamp: DateTime<Utc>,
    pub details: String,
}

/// Answer of a pure transition-table lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionCheck {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_stage: Option<PipelineStage>,
    pub reason: String,
}

/// Looks up `current -> target` in the transition table. Never mutates.
pub fn can_transition(current: PipelineStage, target: PipelineStage) -> TransitionCheck {
    if current.can_move_to(target) {
        return TransitionCheck {
            allowed: true,
            new_stage: Some(target),
            reason: format!("Transition {current} → {target} allowed"),
        };
    }

    let valid = current.allowed_transitions();
    let valid = if valid.is_empty() {
        "none".to_string()
    } else {
        valid
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    TransitionCheck {
        allowed: false,
        new_stage: None,
        reason: format!("Transition {current} → {target} not allowed. Valid transitions: {valid}"),
    }
}

/// Lifecycle record of one tracked item.
///
/// Treated as a value: every tracker operation consumes the status and hands
/// back a new one, so a caller holding an older copy never sees it change.
/// Invariants: the history is never empty, its last entry carries
/// `current_stage`, and `last_updated` is that entry's timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawExecutionStatus")]
pub struct ExecutionStatus {
    row_id: String,
    current_stage: PipelineStage,
    stage_history: Vec<StageHistoryEntry>,
    last_updated: DateTime<Utc>,
    retry_count: u32,
    max_retries: u32,
}

/// Result of [`ExecutionStatus::transition`].
///
/// A rejected transition hands the status back untouched together with the
/// reason from [`can_transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum TransitionOutcome {
    Applied(ExecutionStatus),
    Rejected {
        status: ExecutionStatus,
        reason: String,
    },
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied(_))
    }

    pub fn status(&self) -> &ExecutionStatus {
        match self {
            TransitionOutcome::Applied(status) | TransitionOutcome::Rejected { status, .. } => {
                status
            }
        }
    }

    pub fn into_status(self) -> ExecutionStatus {
        match self {
            TransitionOutcome::Applied(status) | TransitionOutcome::Rejected { status, .. } => {
                status
            }
        }
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            TransitionOutcome::Applied(_) => None,
            TransitionOutcome::Rejected { reason, .. } => Some(reason),
        }
    }
}

impl ExecutionStatus {
    /// Starts tracking `row_id` now, with the default retry budget.
    pub fn new(row_id: impl Into<String>, initial_stage: PipelineStage) -> Self {
        Self::start(row_id, initial_stage, DEFAULT_MAX_RETRIES, Utc::now())
    }

    pub fn start(
        row_id: impl Into<String>,
        initial_stage: PipelineStage,
        max_retries: u32,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            row_id: row_id.into(),
            current_stage: initial_stage,
            stage_history: vec![StageHistoryEntry {
                stage: initial_stage,
                timestamp: at,
                details: "status initialized".to_string(),
            }],
            last_updated: at,
            retry_count: 0,
            max_retries,
        }
    }

    pub fn row_id(&self) -> &str {
        &self.row_id
    }

    pub fn current_stage(&self) -> PipelineStage {
        self.current_stage
    }

    pub fn stage_history(&self) -> &[StageHistoryEntry] {
        &self.stage_history
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn transition(self, target: PipelineStage, details: Option<&str>) -> TransitionOutcome {
        self.transition_at(target, details, Utc::now())
    }

    /// Moves to `target` if the table allows it, recording the entry at `at`.
    ///
    /// Only `failed -> queued_for_execution` counts as a retry.
    pub fn transition_at(
        mut self,
        target: PipelineStage,
        details: Option<&str>,
        at: DateTime<Utc>,
    ) -> TransitionOutcome {
        let check = can_transition(self.current_stage, target);
        if !check.allowed {
            warn!("Invalid transition for {}: {}", self.row_id, check.reason);
            return TransitionOutcome::Rejected {
                status: self,
                reason: check.reason,
            };
        }

        let is_retry = self.current_stage == PipelineStage::Failed
            && target == PipelineStage::QueuedForExecution;
        if is_retry {
            self.retry_count = self.retry_count.saturating_add(1);
        }

        let details = details.map_or_else(|| format!("transition to {target}"), str::to_string);
        self.push_entry(target, details, at);

        debug!(
            "{}: {} (retry {}/{})",
            self.row_id, check.reason, self.retry_count, self.max_retries
        );
        TransitionOutcome::Applied(self)
    }

    pub fn reset(self, reason: &str) -> Self {
        self.reset_at(reason, Utc::now())
    }

    /// Operator override: returns to `awaiting_gherkin` from any stage,
    /// bypassing the transition table, and clears the retry counter.
    pub fn reset_at(mut self, reason: &str, at: DateTime<Utc>) -> Self {
        debug!(
            "{}: reset from {} ({reason})",
            self.row_id, self.current_stage
        );
        self.push_entry(
            PipelineStage::AwaitingGherkin,
            format!("Reset: {reason}"),
            at,
        );
        self.retry_count = 0;
        self
    }

    fn push_entry(&mut self, stage: PipelineStage, details: String, at: DateTime<Utc>) {
        self.stage_history.push(StageHistoryEntry {
            stage,
            timestamp: at,
            details,
        });
        self.current_stage = stage;
        self.last_updated = at;
    }

    pub fn can_retry(&self) -> bool {
        self.current_stage == PipelineStage::Failed && self.retry_count < self.max_retries
    }

    /// Milliseconds from the first history entry to `last_updated`.
    pub fn duration_ms(&self) -> u64 {
        self.stage_history
            .first()
            .map_or(0, |first| elapsed_ms(first.timestamp, self.last_updated))
    }

    /// Time spent per stage, in order of first appearance.
    ///
    /// Each entry's time runs until the next entry; the last one runs until
    /// `last_updated`. Revisited stages accumulate.
    pub fn stage_durations(&self) -> IndexMap<PipelineStage, u64> {
        let mut durations: IndexMap<PipelineStage, u64> = IndexMap::new();
        for (index, entry) in self.stage_history.iter().enumerate() {
            let end = self
                .stage_history
                .get(index + 1)
                .map_or(self.last_updated, |next| next.timestamp);
            let spent = durations.entry(entry.stage).or_insert(0);
            *spent = spent.saturating_add(elapsed_ms(entry.timestamp, end));
        }
        durations
    }

    pub fn is_completed(&self) -> bool {
        self.current_stage == PipelineStage::Completed
    }

    /// Failed with the retry budget spent.
    pub fn is_failed(&self) -> bool {
        self.current_stage == PipelineStage::Failed && self.retry_count >= self.max_retries
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.current_stage,
            PipelineStage::GherkinValidating
                | PipelineStage::QueuedForExecution
                | PipelineStage::Executing
        )
    }

    pub fn summary(&self) -> String {
        let mut summary = self.current_stage.summary_label().to_string();

        let duration = self.duration_ms();
        if duration > 0 {
            summary.push_str(&format!(" ({})", format_seconds(duration, 1)));
        }

        if self.retry_count > 0 {
            summary.push_str(&format!(" [Attempt {}/{}]", self.retry_count, self.max_retries));
        }

        summary
    }
}

#[allow(clippy::cast_sign_loss)]
fn elapsed_ms(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    (to - from).num_milliseconds().max(0) as u64
}

/// Renders milliseconds as seconds, e.g. `1.5s`.
#[allow(clippy::cast_precision_loss)]
pub fn format_seconds(ms: u64, decimals: usize) -> String {
    format!("{:.*}s", decimals, ms as f64 / 1000.0)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExecutionStatus {
    row_id: String,
    current_stage: PipelineStage,
    stage_history: Vec<StageHistoryEntry>,
    last_updated: DateTime<Utc>,
    #[serde(default)]
    retry_count: u32,
    #[serde(default = "default_max_retries")]
    max_retries: u32,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl TryFrom<RawExecutionStatus> for ExecutionStatus {
    type Error = QaPipeError;

    fn try_from(raw: RawExecutionStatus) -> Result<Self, Self::Error> {
        let last = raw.stage_history.last().ok_or_else(|| {
            QaPipeError::InvalidInput(format!("{}: stage history is empty", raw.row_id))
        })?;

        if last.stage != raw.current_stage {
            return Err(QaPipeError::InvalidInput(format!(
                "{}: current stage {} does not match last history entry {}",
                raw.row_id, raw.current_stage, last.stage
            )));
        }

        if last.timestamp != raw.last_updated {
            return Err(QaPipeError::InvalidInput(format!(
                "{}: lastUpdated does not match last history entry",
                raw.row_id
            )));
        }

        Ok(Self {
            row_id: raw.row_id,
            current_stage: raw.current_stage,
            stage_history: raw.stage_history,
            last_updated: raw.last_updated,
            retry_count: raw.retry_count,
            max_retries: raw.max_retries,
        })
    }
}
