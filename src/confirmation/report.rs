use chrono::{DateTime, Utc};

use super::{ConfirmationType, PipelineConfirmation};
use crate::tracker::format_seconds;

const WIDTH: usize = 55;

fn divider() -> String {
    "═".repeat(WIDTH)
}

fn thin_divider() -> String {
    "─".repeat(WIDTH)
}

fn format_date_time(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%d/%m/%Y %H:%M:%S UTC").to_string()
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "✅ Yes"
    } else {
        "❌ No"
    }
}

fn push_section(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(thin_divider());
    lines.push(title.to_string());
    lines.push(thin_divider());
}

/// Renders a confirmation as a multi-section text report.
///
/// Section order is fixed: header, summary, then the Gherkin, execution and
/// evidence blocks when present, then the message line.
pub fn format_confirmation_log(confirmation: &PipelineConfirmation) -> String {
    let summary = &confirmation.summary;
    let mut lines = vec![
        divider(),
        "📋 TEST PIPELINE CONFIRMATION".to_string(),
        divider(),
        format!("ID:        {}", confirmation.id),
        format!("Item:      {}", confirmation.row_id),
        format!("Date/Time: {}", format_date_time(confirmation.timestamp)),
        format!("Type:      {}", confirmation.kind.as_str().to_uppercase()),
    ];

    push_section(&mut lines, "📊 SUMMARY");
    lines.extend([
        format!(
            "  • Gherkin Validated:   {}",
            format_bool(summary.gherkin_validated)
        ),
        format!(
            "  • Tests Executed:      {}",
            format_bool(summary.tests_executed)
        ),
        format!(
            "  • Tests Passed:        {}",
            format_bool(summary.tests_passed)
        ),
        format!(
            "  • Evidence Provided:   {}",
            format_bool(summary.evidence_provided)
        ),
        format!(
            "  • Total Duration:      {}",
            format_seconds(summary.total_duration, 2)
        ),
    ]);

    if let Some(gherkin) = &confirmation.details.gherkin_validation {
        push_section(&mut lines, "📝 GHERKIN");
        lines.extend([
            format!("  • Scenarios:  {}", gherkin.scenario_count),
            format!("  • Steps:      {}", gherkin.step_count),
            format!("  • Validated:  {}", format_date_time(gherkin.validated_at)),
        ]);
    }

    if let Some(execution) = &confirmation.details.test_execution {
        push_section(&mut lines, "🧪 EXECUTION");
        lines.extend([
            format!("  • Started:   {}", format_date_time(execution.started_at)),
            format!(
                "  • Finished:  {}",
                format_date_time(execution.completed_at)
            ),
            format!("  • Passed:    {} scenario(s)", execution.passed_scenarios),
            format!("  • Failed:    {} scenario(s)", execution.failed_scenarios),
        ]);
    }

    if let Some(evidence) = &confirmation.details.evidence {
        push_section(&mut lines, "📷 EVIDENCE");
        lines.extend([
            format!("  • Type:      {}", evidence.kind.as_str()),
            format!("  • Uploaded:  {}", format_date_time(evidence.uploaded_at)),
            format!("  • URL:       {}", evidence.url),
        ]);
    }

    lines.extend([
        String::new(),
        divider(),
        format!("💬 {}", confirmation.message),
        divider(),
    ]);

    lines.join("\n")
}

#[allow(clippy::cast_precision_loss)]
fn percentage(count: usize, total: usize) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Aggregates many confirmations into one text report.
///
/// Success rate is completions over non-skipped items; when every item was
/// skipped (or the list is empty) it renders as 0.0%.
#[allow(clippy::cast_precision_loss)]
pub fn generate_consolidated_report(confirmations: &[PipelineConfirmation]) -> String {
    let total = confirmations.len();
    let count = |kind: ConfirmationType| confirmations.iter().filter(|c| c.kind == kind).count();
    let completed = count(ConfirmationType::Completion);
    let failed = count(ConfirmationType::Failure);
    let skipped = count(ConfirmationType::Skip);
    let in_progress = count(ConfirmationType::Usage);

    let total_duration: u128 = confirmations
        .iter()
        .map(|c| u128::from(c.summary.total_duration))
        .sum();
    let average_seconds = total_duration as f64 / total.max(1) as f64 / 1000.0;

    [
        divider(),
        "📊 TEST PIPELINE CONSOLIDATED REPORT".to_string(),
        divider(),
        String::new(),
        format!("Total Items:          {total}"),
        format!(
            "  ✅ Completed:       {completed} ({:.1}%)",
            percentage(completed, total)
        ),
        format!(
            "  ❌ Failed:          {failed} ({:.1}%)",
            percentage(failed, total)
        ),
        format!(
            "  ⏭️ Skipped:         {skipped} ({:.1}%)",
            percentage(skipped, total)
        ),
        format!(
            "  🔄 In Progress:     {in_progress} ({:.1}%)",
            percentage(in_progress, total)
        ),
        String::new(),
        format!("Average Duration:     {average_seconds:.2}s"),
        format!(
            "Success Rate:         {:.1}%",
            percentage(completed, total - skipped)
        ),
        String::new(),
        divider(),
    ]
    .join("\n")
}
