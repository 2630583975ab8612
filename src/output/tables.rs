use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};
use qapipe::gherkin::Severity;
use qapipe::stage::PipelineStage;

pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn stage_cell(stage: PipelineStage) -> Cell {
    let cell = Cell::new(stage.as_str());
    match stage {
        PipelineStage::Completed | PipelineStage::Passed | PipelineStage::Approved => {
            cell.fg(TableColor::Green)
        }
        PipelineStage::Failed => cell.fg(TableColor::Red),
        PipelineStage::AwaitingGherkin => cell.fg(TableColor::Yellow),
        _ => cell,
    }
}

pub fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("error").fg(TableColor::Red),
        Severity::Warning => Cell::new("warning").fg(TableColor::Yellow),
    }
}
