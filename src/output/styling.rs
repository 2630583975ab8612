use console::{style, StyledObject};
use qapipe::stage::PipelineStage;

pub fn bright_yellow(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn bright_green(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn bright_red(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn cyan(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn dim(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn bright(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright()
}

pub fn magenta_bold(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

/// Pass/fail marker used in overview lines.
pub fn verdict(ok: bool, yes: &str, no: &str) -> StyledObject<String> {
    if ok {
        bright_green(format!("✅ {yes}"))
    } else {
        bright_red(format!("❌ {no}"))
    }
}

/// Green once done, red on failure, yellow while in flight.
pub fn stage_summary(stage: PipelineStage) -> StyledObject<String> {
    match stage {
        PipelineStage::Completed | PipelineStage::Passed | PipelineStage::Approved => {
            bright_green(stage.summary_label())
        }
        PipelineStage::Failed => bright_red(stage.summary_label()),
        _ => bright_yellow(stage.summary_label()),
    }
}
