//! Test-pipeline tracking for QA teams: Gherkin validation, stage lifecycle
//! tracking and audit confirmations.

pub mod config;
pub mod confirmation;
pub mod documents;
pub mod error;
pub mod gherkin;
pub mod stage;
pub mod tracker;
pub mod workflow;

pub use error::{QaPipeError, Result};
pub use gherkin::{validate_gherkin, GherkinValidationResult};
pub use stage::{PipelineStage, TestPipelineStatus};
pub use tracker::{can_transition, ExecutionStatus, TransitionOutcome};
pub use workflow::{initialize_pipeline, process_gherkin_validation};
