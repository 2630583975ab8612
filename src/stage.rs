use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QaPipeError;

/// Fine-grained lifecycle stage of a tracked test item.
///
/// `Completed` is terminal. `Failed` has a retry path back to the execution
/// queue and only becomes final once the retry budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    AwaitingGherkin,
    GherkinValidating,
    GherkinValidated,
    AwaitingApproval,
    Approved,
    QueuedForExecution,
    Executing,
    Passed,
    Failed,
    EvidencePending,
    Completed,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 11] = [
        PipelineStage::AwaitingGherkin,
        PipelineStage::GherkinValidating,
        PipelineStage::GherkinValidated,
        PipelineStage::AwaitingApproval,
        PipelineStage::Approved,
        PipelineStage::QueuedForExecution,
        PipelineStage::Executing,
        PipelineStage::Passed,
        PipelineStage::Failed,
        PipelineStage::EvidencePending,
        PipelineStage::Completed,
    ];

    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::AwaitingGherkin => "awaiting_gherkin",
            PipelineStage::GherkinValidating => "gherkin_validating",
            PipelineStage::GherkinValidated => "gherkin_validated",
            PipelineStage::AwaitingApproval => "awaiting_approval",
            PipelineStage::Approved => "approved",
            PipelineStage::QueuedForExecution => "queued_for_execution",
            PipelineStage::Executing => "executing",
            PipelineStage::Passed => "passed",
            PipelineStage::Failed => "failed",
            PipelineStage::EvidencePending => "evidence_pending",
            PipelineStage::Completed => "completed",
        }
    }

    /// Legal successor stages. An empty slice means the stage is terminal.
    pub fn allowed_transitions(self) -> &'static [PipelineStage] {
        use PipelineStage::*;
        match self {
            AwaitingGherkin => &[GherkinValidating],
            GherkinValidating => &[GherkinValidated, AwaitingGherkin],
            GherkinValidated => &[AwaitingApproval, QueuedForExecution],
            AwaitingApproval => &[Approved, AwaitingGherkin],
            Approved => &[QueuedForExecution],
            QueuedForExecution => &[Executing],
            Executing => &[Passed, Failed],
            Passed => &[EvidencePending, Completed],
            Failed => &[QueuedForExecution, AwaitingGherkin],
            EvidencePending => &[Completed],
            Completed => &[],
        }
    }

    pub fn can_move_to(self, target: PipelineStage) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Coarse status persisted alongside the stage by the storage layer.
    pub fn status(self) -> TestPipelineStatus {
        use PipelineStage::*;
        match self {
            AwaitingGherkin | GherkinValidating => TestPipelineStatus::AwaitingGherkin,
            GherkinValidated | AwaitingApproval | Approved => TestPipelineStatus::GherkinValidated,
            QueuedForExecution | Executing => TestPipelineStatus::InExecution,
            Passed | EvidencePending | Completed => TestPipelineStatus::Completed,
            Failed => TestPipelineStatus::Failed,
        }
    }

    /// Human label used by status summaries.
    pub fn summary_label(self) -> &'static str {
        match self {
            PipelineStage::AwaitingGherkin => "⏳ Awaiting Gherkin",
            PipelineStage::GherkinValidating => "🔍 Validating Gherkin",
            PipelineStage::GherkinValidated => "✅ Gherkin Validated",
            PipelineStage::AwaitingApproval => "⏳ Awaiting Approval",
            PipelineStage::Approved => "✅ Approved",
            PipelineStage::QueuedForExecution => "📋 Queued",
            PipelineStage::Executing => "🚀 Executing",
            PipelineStage::Passed => "✅ Passed",
            PipelineStage::Failed => "❌ Failed",
            PipelineStage::EvidencePending => "📷 Evidence Pending",
            PipelineStage::Completed => "🎉 Completed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineStage {
    type Err = QaPipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PipelineStage::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| QaPipeError::InvalidInput(format!("unknown pipeline stage '{s}'")))
    }
}

/// User-facing status stored next to the fine-grained stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestPipelineStatus {
    /// Item has not entered the pipeline; no stage maps here.
    #[serde(rename = "Não Iniciado")]
    NotStarted,
    #[serde(rename = "Aguardando Gherkin")]
    AwaitingGherkin,
    #[serde(rename = "Gherkin Validado")]
    GherkinValidated,
    #[serde(rename = "Em Execução")]
    InExecution,
    #[serde(rename = "Concluído")]
    Completed,
    #[serde(rename = "Falhou")]
    Failed,
}

impl TestPipelineStatus {
    pub fn label(self) -> &'static str {
        match self {
            TestPipelineStatus::NotStarted => "Não Iniciado",
            TestPipelineStatus::AwaitingGherkin => "Aguardando Gherkin",
            TestPipelineStatus::GherkinValidated => "Gherkin Validado",
            TestPipelineStatus::InExecution => "Em Execução",
            TestPipelineStatus::Completed => "Concluído",
            TestPipelineStatus::Failed => "Falhou",
        }
    }
}

impl fmt::Display for TestPipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    mod allowed_transitions {
        use super::*;

        #[test]
        fn completed_is_the_only_terminal_stage() {
            let terminal: Vec<_> = PipelineStage::ALL
                .iter()
                .filter(|s| s.is_terminal())
                .collect();
            assert_eq!(terminal, vec![&PipelineStage::Completed]);
        }

        #[test]
        fn table_has_no_self_loops() {
            for stage in PipelineStage::ALL {
                assert!(!stage.can_move_to(stage), "{stage} loops onto itself");
            }
        }

        #[test]
        fn failed_can_retry_or_restart() {
            assert!(PipelineStage::Failed.can_move_to(PipelineStage::QueuedForExecution));
            assert!(PipelineStage::Failed.can_move_to(PipelineStage::AwaitingGherkin));
            assert!(!PipelineStage::Failed.can_move_to(PipelineStage::Executing));
        }

        #[test]
        fn table_has_sixteen_edges() {
            let edges: usize = PipelineStage::ALL
                .iter()
                .map(|s| s.allowed_transitions().len())
                .sum();
            assert_eq!(edges, 16);
        }
    }

    mod status_mapping {
        use super::*;

        #[test]
        fn maps_every_stage_to_five_distinct_labels() {
            let labels: HashSet<_> = PipelineStage::ALL.iter().map(|s| s.status()).collect();
            assert_eq!(labels.len(), 5);
            assert!(!labels.contains(&TestPipelineStatus::NotStarted));
        }

        #[test]
        fn uses_portuguese_persistence_labels() {
            assert_eq!(
            PipelineStage::GherkinValidating.status().label(),
            "Aguardando Gherkin"
        );
            assert_eq!(PipelineStage::Approved.status().label(), "Gherkin Validado");
            assert_eq!(PipelineStage::Executing.status().label(), "Em Execução");
            assert_eq!(PipelineStage::EvidencePending.status().label(), "Concluído");
            assert_eq!(PipelineStage::Failed.status().label(), "Falhou");
        }

        #[test]
        fn serializes_status_as_label() {
            let json = serde_json::to_string(&TestPipelineStatus::InExecution).unwrap();
            assert_eq!(json, "\"Em Execução\"");
        }
    }

    mod parsing {
        use super::*;

        #[test]
        fn round_trips_wire_names() {
            for stage in PipelineStage::ALL {
                assert_eq!(stage.as_str().parse::<PipelineStage>().unwrap(), stage);
                let json = serde_json::to_string(&stage).unwrap();
                assert_eq!(json, format!("\"{}\"", stage.as_str()));
            }
        }

        #[test]
        fn rejects_unknown_stage() {
            let err = "shipping".parse::<PipelineStage>().unwrap_err();
            assert!(err.to_string().contains("shipping"));
        }
    }
}
