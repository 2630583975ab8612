use std::fmt::Write;

use comfy_table::{Cell, Color as TableColor};
use qapipe::confirmation::{format_confirmation_log, PipelineConfirmation};
use qapipe::documents::ReplayResult;
use qapipe::gherkin::{ErrorType, GherkinValidationResult};
use qapipe::stage::PipelineStage;
use qapipe::tracker::format_seconds;

use super::styling::{bright, bright_yellow, cyan, dim, stage_summary, verdict};
use super::tables::{create_cyan_header, create_table, severity_cell, stage_cell};

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn error_type_label(kind: ErrorType) -> &'static str {
    match kind {
        ErrorType::Syntax => "syntax",
        ErrorType::Semantic => "semantic",
        ErrorType::BestPractice => "best-practice",
    }
}

/// Metrics overview followed by one table row per finding, errors first.
pub fn render_validation(source: &str, result: &GherkinValidationResult) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "🧪", "Gherkin Validation");
    let validated_at = result.validated_at.map_or_else(
        || "-".to_string(),
        |at| at.format("%Y-%m-%d %H:%M UTC").to_string(),
    );
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n",
        dim("File:"),
        cyan(source),
        dim("Result:"),
        verdict(result.is_valid, "Valid", "Invalid"),
        dim("Scenarios:"),
        bright_yellow(result.metrics.scenario_count),
        dim("Steps:"),
        bright_yellow(result.metrics.step_count),
        dim("Background:"),
        yes_no(result.metrics.has_background),
        dim("Examples:"),
        yes_no(result.metrics.has_examples),
        dim("Validated at:"),
        dim(validated_at),
    );

    if result.errors.is_empty() && result.warnings.is_empty() {
        let _ = writeln!(output, "{}", dim("No findings."));
        return output;
    }

    add_section_header(&mut output, "📝", "Findings");
    let mut table = create_table();
    table.set_header(create_cyan_header(&[
        "Line",
        "Severity",
        "Type",
        "Message",
        "Suggestion",
    ]));
    for finding in result.errors.iter().chain(&result.warnings) {
        table.add_row(vec![
            Cell::new(finding.line),
            severity_cell(finding.severity),
            Cell::new(error_type_label(finding.kind)),
            Cell::new(&finding.message),
            Cell::new(finding.suggestion.as_deref().unwrap_or("")).fg(TableColor::DarkGrey),
        ]);
    }
    let _ = writeln!(output, "{table}");

    output
}

pub fn render_scenarios(scenarios: &[String], step_count: usize) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📋", "Scenarios");
    if scenarios.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No scenarios found."));
    } else {
        let mut table = create_table();
        table.set_header(create_cyan_header(&["#", "Scenario"]));
        for (index, scenario) in scenarios.iter().enumerate() {
            table.add_row(vec![Cell::new(index + 1), Cell::new(scenario)]);
        }
        let _ = writeln!(output, "{table}");
    }
    let _ = writeln!(
        output,
        "  {} {}",
        dim("Total steps:"),
        bright_yellow(step_count)
    );

    output
}

/// Every stage with its allowed successors and persisted status label.
pub fn render_transitions() -> String {
    let mut output = String::new();

    add_section_header(&mut output, "🔀", "Stage Transitions");
    let mut table = create_table();
    table.set_header(create_cyan_header(&["Stage", "Allowed Next", "Status"]));
    for stage in PipelineStage::ALL {
        let targets = stage.allowed_transitions();
        let next = if targets.is_empty() {
            Cell::new("(terminal)").fg(TableColor::DarkGrey)
        } else {
            Cell::new(
                targets
                    .iter()
                    .map(|target| target.as_str())
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        };
        table.add_row(vec![stage_cell(stage), next, Cell::new(stage.status().label())]);
    }
    let _ = writeln!(output, "{table}");

    output
}

pub fn render_replay(result: &ReplayResult, confirmation: &PipelineConfirmation) -> String {
    let mut output = String::new();
    let status = &result.status;

    add_section_header(&mut output, "📊", "Overview");
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}/{}\n  {} {}\n",
        dim("Item:"),
        cyan(status.row_id()),
        dim("Stage:"),
        stage_summary(status.current_stage()),
        dim("Status:"),
        status.current_stage().status(),
        dim("Retries:"),
        bright_yellow(status.retry_count()),
        status.max_retries(),
        dim("Summary:"),
        status.summary(),
    );

    add_section_header(&mut output, "🕒", "Stage History");
    let mut history = create_table();
    history.set_header(create_cyan_header(&["#", "Stage", "Reached At", "Details"]));
    for (index, entry) in status.stage_history().iter().enumerate() {
        history.add_row(vec![
            Cell::new(index + 1),
            stage_cell(entry.stage),
            Cell::new(entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC")),
            Cell::new(&entry.details),
        ]);
    }
    let _ = writeln!(output, "{history}\n");

    add_section_header(&mut output, "⏱️", "Stage Durations");
    let mut durations = create_table();
    durations.set_header(create_cyan_header(&["Stage", "Time Spent"]));
    for (stage, ms) in status.stage_durations() {
        durations.add_row(vec![stage_cell(stage), Cell::new(format_seconds(ms, 1))]);
    }
    let _ = writeln!(output, "{durations}\n");

    if !result.rejected.is_empty() {
        add_section_header(&mut output, "⚠️", "Rejected Events");
        let mut rejected = create_table();
        rejected.set_header(create_cyan_header(&["Event", "Target", "Reason"]));
        for event in &result.rejected {
            rejected.add_row(vec![
                Cell::new(event.index + 1),
                stage_cell(event.stage),
                Cell::new(&event.reason).fg(TableColor::Red),
            ]);
        }
        let _ = writeln!(output, "{rejected}\n");
    }

    output.push_str(&format_confirmation_log(confirmation));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use qapipe::config::TrackerConfig;
    use qapipe::confirmation::generate_confirmation;
    use qapipe::documents::{ReplayDocument, ReplayEvent};
    use qapipe::gherkin::validate_gherkin;

    fn event(stage: PipelineStage) -> ReplayEvent {
        ReplayEvent {
            stage: Some(stage),
            reset: None,
            details: None,
            at: None,
            executed_by: None,
        }
    }

    #[test]
    fn test_render_validation_lists_findings() {
        let result = validate_gherkin("Feature: Login\nScenario: no steps\nGiven a user");
        let rendered = render_validation("login.feature", &result);

        assert!(rendered.contains("Gherkin Validation"));
        assert!(rendered.contains("login.feature"));
        assert!(rendered.contains("Invalid"));
        assert!(rendered.contains("Findings"));
        assert!(rendered.contains("semantic"));
    }

    #[test]
    fn test_render_validation_without_findings() {
        let result = validate_gherkin(
            "Feature: Login\nScenario: ok\nGiven a user\nWhen they sign in\nThen they see the home page",
        );
        let rendered = render_validation("ok.feature", &result);

        assert!(rendered.contains("Valid"));
        assert!(rendered.contains("No findings."));
        assert!(!rendered.contains("Findings\n"));
    }

    #[test]
    fn test_render_scenarios_handles_empty_input() {
        let rendered = render_scenarios(&[], 0);
        assert!(rendered.contains("No scenarios found."));
        assert!(rendered.contains("Total steps:"));
    }

    #[test]
    fn test_render_transitions_covers_every_stage() {
        let rendered = render_transitions();
        for stage in PipelineStage::ALL {
            assert!(rendered.contains(stage.as_str()), "missing {stage}");
        }
        assert!(rendered.contains("(terminal)"));
        assert!(rendered.contains("Em Execução"));
    }

    #[test]
    fn test_render_replay_includes_rejections_and_log() {
        let document = ReplayDocument {
            row_id: "row-9".to_string(),
            initial_stage: None,
            max_retries: None,
            started_at: None,
            events: vec![
                event(PipelineStage::GherkinValidating),
                event(PipelineStage::Completed),
            ],
        };
        let result = document.replay(&TrackerConfig::default()).unwrap();
        let confirmation = generate_confirmation("row-9", &result.status, None, None);
        let rendered = render_replay(&result, &confirmation);

        assert!(rendered.contains("row-9"));
        assert!(rendered.contains("Stage History"));
        assert!(rendered.contains("Stage Durations"));
        assert!(rendered.contains("Rejected Events"));
        assert!(rendered.contains("TEST PIPELINE CONFIRMATION"));
    }
}
