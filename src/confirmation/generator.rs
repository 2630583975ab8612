use chrono::{DateTime, Utc};
use log::debug;
use url::Url;
use uuid::Uuid;

use super::{
    ConfirmationType, EvidenceDetails, EvidenceKind, GeneratedBy, GherkinValidationDetails,
    PipelineConfirmation, PipelineConfirmationDetails, PipelineConfirmationSummary,
    TestExecutionDetails,
};
use crate::gherkin::GherkinValidationResult;
use crate::stage::PipelineStage;
use crate::tracker::{format_seconds, ExecutionStatus};

const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "webm", "avi", "mov"];
const REPORT_EXTENSIONS: [&str; 3] = ["html", "pdf", "json"];

pub fn generate_confirmation(
    row_id: &str,
    status: &ExecutionStatus,
    gherkin: Option<&GherkinValidationResult>,
    evidence_url: Option<&str>,
) -> PipelineConfirmation {
    generate_confirmation_at(row_id, status, gherkin, evidence_url, Utc::now())
}

/// Builds the audit record for `status` as of `now`.
///
/// An empty evidence URL counts as no evidence.
pub fn generate_confirmation_at(
    row_id: &str,
    status: &ExecutionStatus,
    gherkin: Option<&GherkinValidationResult>,
    evidence_url: Option<&str>,
    now: DateTime<Utc>,
) -> PipelineConfirmation {
    let evidence_url = evidence_url.filter(|url| !url.is_empty());
    let kind = classify(status);
    let stage = status.current_stage();

    let summary = PipelineConfirmationSummary {
        gherkin_validated: stage != PipelineStage::AwaitingGherkin,
        tests_executed: matches!(
            stage,
            PipelineStage::Passed
                | PipelineStage::Failed
                | PipelineStage::Completed
                | PipelineStage::EvidencePending
        ),
        tests_passed: matches!(
            stage,
            PipelineStage::Passed | PipelineStage::Completed | PipelineStage::EvidencePending
        ),
        evidence_provided: evidence_url.is_some(),
        total_duration: status.duration_ms(),
    };

    let details = PipelineConfirmationDetails {
        gherkin_validation: gherkin.and_then(|result| {
            result
                .validated_at
                .map(|validated_at| GherkinValidationDetails {
                    scenario_count: result.metrics.scenario_count,
                    step_count: result.metrics.step_count,
                    validated_at,
                })
        }),
        test_execution: test_execution(status, gherkin),
        evidence: evidence_url.map(|url| EvidenceDetails {
            url: url.to_string(),
            uploaded_at: now,
            kind: detect_evidence_kind(url),
        }),
    };

    let message = render_message(kind, status, &summary);
    debug!("Generated {} confirmation for {row_id}", kind.as_str());

    PipelineConfirmation {
        id: Uuid::new_v4(),
        row_id: row_id.to_string(),
        timestamp: now,
        kind,
        summary,
        details,
        message,
        generated_by: GeneratedBy::System,
    }
}

/// Completion first, then permanent failure, then skip; anything else is usage.
fn classify(status: &ExecutionStatus) -> ConfirmationType {
    if status.is_completed() {
        ConfirmationType::Completion
    } else if status.is_failed() {
        ConfirmationType::Failure
    } else if status.current_stage() == PipelineStage::AwaitingGherkin {
        ConfirmationType::Skip
    } else {
        ConfirmationType::Usage
    }
}

fn test_execution(
    status: &ExecutionStatus,
    gherkin: Option<&GherkinValidationResult>,
) -> Option<TestExecutionDetails> {
    let history = status.stage_history();
    let start_index = history
        .iter()
        .position(|entry| entry.stage == PipelineStage::Executing)?;
    let started = &history[start_index];
    let finished = history[start_index + 1..]
        .iter()
        .find(|entry| matches!(entry.stage, PipelineStage::Passed | PipelineStage::Failed))?;

    let scenarios = gherkin
        .map(|result| result.metrics.scenario_count)
        .filter(|count| *count > 0)
        .unwrap_or(1);
    let passed = finished.stage == PipelineStage::Passed;

    Some(TestExecutionDetails {
        started_at: started.timestamp,
        completed_at: finished.timestamp,
        passed_scenarios: if passed { scenarios } else { 0 },
        failed_scenarios: if passed { 0 } else { scenarios },
    })
}

/// Infers the evidence kind from the file extension of the URL path.
/// Query strings and fragments are ignored; unknown extensions are screenshots.
pub(crate) fn detect_evidence_kind(url: &str) -> EvidenceKind {
    let path = Url::parse(url).map_or_else(
        |_| url.split(['?', '#']).next().unwrap_or(url).to_string(),
        |parsed| parsed.path().to_string(),
    );
    let file_name = path.rsplit('/').next().unwrap_or(&path);
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        EvidenceKind::Video
    } else if REPORT_EXTENSIONS.contains(&extension.as_str()) {
        EvidenceKind::Report
    } else {
        EvidenceKind::Screenshot
    }
}

fn render_message(
    kind: ConfirmationType,
    status: &ExecutionStatus,
    summary: &PipelineConfirmationSummary,
) -> String {
    let duration = format_seconds(summary.total_duration, 1);
    let stage = status.current_stage();

    match kind {
        ConfirmationType::Usage => {
            format!("✅ Test pipeline used. Stage: {stage}. Duration: {duration}")
        }
        ConfirmationType::Completion => format!(
            "🎉 Test cycle completed successfully! Gherkin: {}, Tests: {}, Evidence: {}. Total duration: {duration}",
            if summary.gherkin_validated { "OK" } else { "Pending" },
            if summary.tests_passed { "PASSED" } else { "N/A" },
            if summary.evidence_provided { "OK" } else { "Pending" },
        ),
        ConfirmationType::Failure => format!(
            "❌ Failed after {} attempt(s). Final stage: {stage}. Requires manual analysis.",
            status.retry_count()
        ),
        ConfirmationType::Skip => {
            "⏭️ Item not processed by the pipeline (awaiting Gherkin).".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gherkin::validate_gherkin;
    use crate::tracker::TransitionOutcome;
    use chrono::{Duration, TimeZone};
    use PipelineStage::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn walk(path: &[PipelineStage]) -> ExecutionStatus {
        let mut status = ExecutionStatus::start("r1", AwaitingGherkin, 3, t0());
        for (i, stage) in path.iter().enumerate() {
            let at = t0() + Duration::seconds(i64::try_from(i + 1).unwrap() * 10);
            status = match status.transition_at(*stage, None, at) {
                TransitionOutcome::Applied(next) => next,
                TransitionOutcome::Rejected { reason, .. } => panic!("{reason}"),
            };
        }
        status
    }

    fn passed_path() -> Vec<PipelineStage> {
        vec![
            GherkinValidating,
            GherkinValidated,
            QueuedForExecution,
            Executing,
            Passed,
        ]
    }

    fn exhausted() -> ExecutionStatus {
        let mut path = vec![
            GherkinValidating,
            GherkinValidated,
            QueuedForExecution,
            Executing,
            Failed,
        ];
        for _ in 0..3 {
            path.extend([QueuedForExecution, Executing, Failed]);
        }
        walk(&path)
    }

    mod classification {
        use super::*;

        #[test]
        fn covers_the_four_canonical_cases() {
            let mut completed = passed_path();
            completed.push(Completed);

            let cases = [
                (walk(&completed), ConfirmationType::Completion),
                (exhausted(), ConfirmationType::Failure),
                (walk(&[]), ConfirmationType::Skip),
                (
                    walk(&[GherkinValidating, GherkinValidated]),
                    ConfirmationType::Usage,
                ),
            ];
            for (status, expected) in cases {
                let confirmation = generate_confirmation_at("r1", &status, None, None, t0());
                assert_eq!(confirmation.kind, expected);
            }
        }

        #[test]
        fn recoverable_failure_is_usage() {
            let status = walk(&[
                GherkinValidating,
                GherkinValidated,
                QueuedForExecution,
                Executing,
                Failed,
            ]);
            let confirmation = generate_confirmation("r1", &status, None, None);
            assert_eq!(confirmation.kind, ConfirmationType::Usage);
            assert!(confirmation.summary.tests_executed);
            assert!(!confirmation.summary.tests_passed);
        }
    }

    mod summary {
        use super::*;

        #[test]
        fn reflects_stage_and_evidence() {
            let status = walk(&passed_path());
            let confirmation =
                generate_confirmation_at("r1", &status, None, Some("https://cdn/x.png"), t0());
            let summary = &confirmation.summary;
            assert!(summary.gherkin_validated);
            assert!(summary.tests_executed);
            assert!(summary.tests_passed);
            assert!(summary.evidence_provided);
            assert_eq!(summary.total_duration, 50_000);
        }

        #[test]
        fn empty_evidence_url_counts_as_missing() {
            let confirmation = generate_confirmation_at("r1", &walk(&[]), None, Some(""), t0());
            assert!(!confirmation.summary.evidence_provided);
            assert!(confirmation.details.evidence.is_none());
            assert!(!confirmation.summary.gherkin_validated);
        }

        #[test]
        fn ids_are_unique_per_call() {
            let status = walk(&[]);
            let a = generate_confirmation("r1", &status, None, None);
            let b = generate_confirmation("r1", &status, None, None);
            assert_ne!(a.id, b.id);
            assert_eq!(a.generated_by, GeneratedBy::System);
        }
    }

    mod details {
        use super::*;

        #[test]
        fn copies_gherkin_metrics_when_validated() {
            let gherkin = validate_gherkin(
                "Feature: X\nScenario: a\nGiven a\nThen b\nScenario: c\nGiven c\nThen d",
            );
            let confirmation =
                generate_confirmation_at("r1", &walk(&passed_path()), Some(&gherkin), None, t0());
            let validation = confirmation.details.gherkin_validation.unwrap();
            assert_eq!(validation.scenario_count, 2);
            assert_eq!(validation.step_count, 4);
            assert_eq!(Some(validation.validated_at), gherkin.validated_at);

            let execution = confirmation.details.test_execution.unwrap();
            assert_eq!(execution.passed_scenarios, 2);
            assert_eq!(execution.failed_scenarios, 0);
        }

        #[test]
        fn skips_gherkin_block_for_empty_validation() {
            let gherkin = validate_gherkin("");
            let confirmation =
                generate_confirmation_at("r1", &walk(&[]), Some(&gherkin), None, t0());
            assert!(confirmation.details.gherkin_validation.is_none());
        }

        #[test]
        fn execution_block_needs_a_finished_run() {
            let running = walk(&[
                GherkinValidating,
                GherkinValidated,
                QueuedForExecution,
                Executing,
            ]);
            let confirmation = generate_confirmation_at("r1", &running, None, None, t0());
            assert!(confirmation.details.test_execution.is_none());
        }

        #[test]
        fn execution_block_uses_first_run_and_defaults_to_one_scenario() {
            let status = exhausted();
            let confirmation = generate_confirmation_at("r1", &status, None, None, t0());
            let execution = confirmation.details.test_execution.unwrap();
            assert_eq!(execution.started_at, t0() + Duration::seconds(40));
            assert_eq!(execution.completed_at, t0() + Duration::seconds(50));
            assert_eq!(execution.passed_scenarios, 0);
            assert_eq!(execution.failed_scenarios, 1);
        }

        #[test]
        fn evidence_block_records_kind_and_upload_time() {
            let confirmation = generate_confirmation_at(
                "r1",
                &walk(&passed_path()),
                None,
                Some("https://storage/run/recording.MP4"),
                t0(),
            );
            let evidence = confirmation.details.evidence.unwrap();
            assert_eq!(evidence.kind, EvidenceKind::Video);
            assert_eq!(evidence.uploaded_at, t0());
        }
    }

    mod detect_evidence_kind {
        use super::*;

        #[test]
        fn recognises_videos_and_reports() {
            assert_eq!(
                detect_evidence_kind("https://x/a.webm"),
                EvidenceKind::Video
            );
            assert_eq!(
                detect_evidence_kind("https://x/run.mov"),
                EvidenceKind::Video
            );
            assert_eq!(
                detect_evidence_kind("https://x/report.pdf"),
                EvidenceKind::Report
            );
            assert_eq!(detect_evidence_kind("results.json"), EvidenceKind::Report);
        }

        #[test]
        fn ignores_query_strings() {
            assert_eq!(
                detect_evidence_kind("https://x/clip.mp4?token=abc#t=3"),
                EvidenceKind::Video
            );
            assert_eq!(
                detect_evidence_kind("out/index.html?v=2"),
                EvidenceKind::Report
            );
        }

        #[test]
        fn falls_back_to_screenshot() {
            assert_eq!(
                detect_evidence_kind("https://x/shot.png"),
                EvidenceKind::Screenshot
            );
            assert_eq!(
                detect_evidence_kind("https://x.pdf/evidence"),
                EvidenceKind::Screenshot
            );
            assert_eq!(
                detect_evidence_kind("no-extension"),
                EvidenceKind::Screenshot
            );
        }
    }

    mod messages {
        use super::*;

        #[test]
        fn renders_each_template() {
            let mut completed = passed_path();
            completed.push(Completed);
            let completion = generate_confirmation_at("r1", &walk(&completed), None, None, t0());
            assert_eq!(
                completion.message,
                "🎉 Test cycle completed successfully! Gherkin: OK, Tests: PASSED, Evidence: Pending. Total duration: 60.0s"
            );

            let failure = generate_confirmation_at("r1", &exhausted(), None, None, t0());
            assert_eq!(
                failure.message,
                "❌ Failed after 3 attempt(s). Final stage: failed. Requires manual analysis."
            );

            let skip = generate_confirmation_at("r1", &walk(&[]), None, None, t0());
            assert_eq!(
                skip.message,
                "⏭️ Item not processed by the pipeline (awaiting Gherkin)."
            );

            let usage =
                generate_confirmation_at("r1", &walk(&[GherkinValidating]), None, None, t0());
            assert_eq!(
                usage.message,
                "✅ Test pipeline used. Stage: gherkin_validating. Duration: 10.0s"
            );
        }
    }
}
