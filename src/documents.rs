//! File formats read by the command-line front end.

use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::TrackerConfig;
use crate::confirmation::{
    create_log_entry_at, PipelineAction, PipelineConfirmation, PipelineConfirmationEntry,
};
use crate::error::{QaPipeError, Result};
use crate::stage::PipelineStage;
use crate::tracker::{ExecutionStatus, TransitionOutcome};

/// Recorded lifecycle of one item, replayed through the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReplayDocument {
    pub row_id: String,
    #[serde(default)]
    pub initial_stage: Option<PipelineStage>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub events: Vec<ReplayEvent>,
}

/// Either a stage transition or an operator reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReplayEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<PipelineStage>,
    /// Reset reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedEvent {
    /// 0-based position in the document's event list
    pub index: usize,
    pub stage: PipelineStage,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub status: ExecutionStatus,
    pub rejected: Vec<RejectedEvent>,
    pub audit_log: Vec<PipelineConfirmationEntry>,
}

impl ReplayDocument {
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let document = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&contents)?,
            Some("toml") => toml::from_str(&contents)?,
            _ => serde_json::from_str(&contents)?,
        };
        Ok(document)
    }

    /// Applies every event in order. Rejected transitions are collected,
    /// not fatal; a malformed event aborts the replay.
    pub fn replay(&self, defaults: &TrackerConfig) -> Result<ReplayResult> {
        let started_at = self.started_at.unwrap_or_else(Utc::now);
        let mut status = ExecutionStatus::start(
            self.row_id.as_str(),
            self.initial_stage.unwrap_or(defaults.initial_stage),
            self.max_retries.unwrap_or(defaults.max_retries),
            started_at,
        );
        let mut rejected = Vec::new();
        let mut audit_log = Vec::new();

        for (index, event) in self.events.iter().enumerate() {
            let at = event.at.unwrap_or_else(Utc::now);
            let executed_by = event.executed_by.as_deref();

            match (&event.stage, &event.reset) {
                (Some(stage), None) => {
                    match status.transition_at(*stage, event.details.as_deref(), at) {
                        TransitionOutcome::Applied(next) => {
                            if let Some(action) = PipelineAction::for_stage(*stage) {
                                let details = next
                                    .stage_history()
                                    .last()
                                    .map(|entry| entry.details.clone())
                                    .unwrap_or_default();
                                audit_log.push(create_log_entry_at(
                                    action,
                                    details,
                                    executed_by,
                                    at,
                                ));
                            }
                            status = next;
                        }
                        TransitionOutcome::Rejected {
                            status: unchanged,
                            reason,
                        } => {
                            rejected.push(RejectedEvent {
                                index,
                                stage: *stage,
                                reason,
                            });
                            status = unchanged;
                        }
                    }
                }
                (None, Some(reason)) => {
                    status = status.reset_at(reason, at);
                    audit_log.push(create_log_entry_at(
                        PipelineAction::PipelineReset,
                        format!("Reset: {reason}"),
                        executed_by,
                        at,
                    ));
                }
                _ => {
                    return Err(QaPipeError::InvalidInput(format!(
                        "event {index} of {} must set exactly one of `stage` or `reset`",
                        self.row_id
                    )));
                }
            }
        }

        if !rejected.is_empty() {
            warn!(
                "{}: {} event(s) rejected during replay",
                self.row_id,
                rejected.len()
            );
        }
        debug!(
            "{}: replayed {} event(s), now at {}",
            self.row_id,
            self.events.len(),
            status.current_stage()
        );

        Ok(ReplayResult {
            status,
            rejected,
            audit_log,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<PipelineConfirmation>),
    One(Box<PipelineConfirmation>),
}

/// Reads confirmations saved as a JSON array or a single JSON object.
pub fn load_confirmations(path: &Path) -> Result<Vec<PipelineConfirmation>> {
    let contents = std::fs::read_to_string(path)?;
    let confirmations = match serde_json::from_str(&contents)? {
        OneOrMany::Many(confirmations) => confirmations,
        OneOrMany::One(confirmation) => vec![*confirmation],
    };
    Ok(confirmations)
}
