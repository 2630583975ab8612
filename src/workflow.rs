//! Convenience flows that chain the validator and the tracker.

use chrono::{DateTime, Utc};
use log::info;

use crate::gherkin::{GherkinValidationResult, Validator};
use crate::stage::PipelineStage;
use crate::tracker::{ExecutionStatus, TransitionOutcome};

/// Outcome of validating an item's scenario text and advancing it.
#[derive(Debug, Clone)]
pub struct GherkinProcessing {
    pub outcome: TransitionOutcome,
    pub validation: GherkinValidationResult,
}

/// Starts tracking an item at `awaiting_gherkin`.
pub fn initialize_pipeline(row_id: &str) -> ExecutionStatus {
    ExecutionStatus::new(row_id, PipelineStage::AwaitingGherkin)
}

pub fn process_gherkin_validation(
    row_id: &str,
    gherkin_text: &str,
    current: Option<ExecutionStatus>,
) -> GherkinProcessing {
    process_gherkin_validation_with(
        &Validator::default(),
        row_id,
        gherkin_text,
        current,
        Utc::now(),
    )
}

/// Validates `gherkin_text` and moves the item accordingly.
///
/// Items waiting for Gherkin pass through `gherkin_validating` first. A valid
/// document then lands on `gherkin_validated`, an invalid one goes back to
/// `awaiting_gherkin`. Items in any other stage get a rejected outcome.
pub fn process_gherkin_validation_with(
    validator: &Validator,
    row_id: &str,
    gherkin_text: &str,
    current: Option<ExecutionStatus>,
    at: DateTime<Utc>,
) -> GherkinProcessing {
    let mut status = current.unwrap_or_else(|| {
        ExecutionStatus::start(
            row_id,
            PipelineStage::AwaitingGherkin,
            crate::tracker::DEFAULT_MAX_RETRIES,
            at,
        )
    });

    if status.current_stage() == PipelineStage::AwaitingGherkin {
        status = status
            .transition_at(
                PipelineStage::GherkinValidating,
                Some("Gherkin submitted for validation"),
                at,
            )
            .into_status();
    }

    let validation = validator.validate(gherkin_text);
    let (target, details) = if validation.is_valid {
        (PipelineStage::GherkinValidated, "Gherkin valid")
    } else {
        (
            PipelineStage::AwaitingGherkin,
            "Gherkin invalid - correction required",
        )
    };

    let outcome = status.transition_at(target, Some(details), at);
    if outcome.is_applied() {
        let verdict = if validation.is_valid {
            "accepted"
        } else {
            "sent back"
        };
        info!(
            "{}: Gherkin {} ({} error(s), {} warning(s))",
            outcome.status().row_id(),
            verdict,
            validation.errors.len(),
            validation.warnings.len()
        );
    }

    GherkinProcessing {
        outcome,
        validation,
    }
}
