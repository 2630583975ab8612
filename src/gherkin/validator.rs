use chrono::Utc;
use log::debug;

use super::keywords::{classify, KeywordCategory, STEP_CATEGORIES};
use super::{
    ErrorType, GherkinMetrics, GherkinValidationError, GherkinValidationResult, ValidatedBy,
};

pub const DEFAULT_MAX_SCENARIOS_PER_FILE: usize = 10;

/// Validates Gherkin text with the default scenario threshold.
pub fn validate_gherkin(text: &str) -> GherkinValidationResult {
    Validator::default().validate(text)
}

/// Line-oriented structural and semantic checker for Gherkin documents.
///
/// Total over its input: malformed text yields findings, never a panic.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    max_scenarios_per_file: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            max_scenarios_per_file: DEFAULT_MAX_SCENARIOS_PER_FILE,
        }
    }
}

impl Validator {
    pub fn new(max_scenarios_per_file: usize) -> Self {
        Self {
            max_scenarios_per_file,
        }
    }

    pub fn validate(&self, text: &str) -> GherkinValidationResult {
        if text.trim().is_empty() {
            return empty_result();
        }

        let mut state = ValidationState::default();
        for (index, line) in text.lines().enumerate() {
            state.process_line(line, index + 1);
        }
        state.finish(self.max_scenarios_per_file);

        let result = GherkinValidationResult {
            is_valid: state.errors.is_empty(),
            metrics: state.metrics(),
            errors: state.errors,
            warnings: state.warnings,
            validated_at: Some(Utc::now()),
            validated_by: ValidatedBy::Automated,
        };

        debug!(
            "Validated Gherkin: {} scenario(s), {} step(s), {} error(s), {} warning(s)",
            result.metrics.scenario_count,
            result.metrics.step_count,
            result.errors.len(),
            result.warnings.len()
        );

        result
    }
}

fn empty_result() -> GherkinValidationResult {
    GherkinValidationResult {
        is_valid: false,
        errors: vec![GherkinValidationError::error(
            0,
            ErrorType::Syntax,
            "empty input: no Gherkin text was provided.",
        )],
        warnings: Vec::new(),
        metrics: GherkinMetrics::default(),
        validated_at: None,
        validated_by: ValidatedBy::Automated,
    }
}

#[derive(Default)]
struct ValidationState {
    has_feature: bool,
    has_scenario: bool,
    in_scenario: bool,
    given_in_scenario: bool,
    then_in_scenario: bool,
    scenario_count: usize,
    step_count: usize,
    has_background: bool,
    has_examples: bool,
    last_scenario_line: usize,
    errors: Vec<GherkinValidationError>,
    warnings: Vec<GherkinValidationError>,
}

impl ValidationState {
    fn process_line(&mut self, line: &str, line_number: usize) {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return;
        }

        let Some(category) = classify(trimmed) else {
            return;
        };

        match category {
            KeywordCategory::Feature => {
                if self.has_feature {
                    self.errors.push(
                        GherkinValidationError::error(
                            line_number,
                            ErrorType::Syntax,
                            "Multiple Features detected: only one Feature per file.",
                        )
                        .with_suggestion(
                            "Remove duplicate Features or split them into separate files.",
                        ),
                    );
                }
                self.has_feature = true;
            }
            KeywordCategory::Background => {
                self.has_background = true;
                self.in_scenario = false;
            }
            KeywordCategory::Scenario | KeywordCategory::ScenarioOutline => {
                self.close_scenario(false);
                self.in_scenario = true;
                self.given_in_scenario = false;
                self.then_in_scenario = false;
                self.has_scenario = true;
                self.scenario_count += 1;
                self.last_scenario_line = line_number;
            }
            KeywordCategory::Given => {
                self.given_in_scenario = true;
                self.step_count += 1;
            }
            KeywordCategory::When => {
                self.step_count += 1;
                if self.in_scenario && !self.given_in_scenario {
                    self.warnings.push(
                        GherkinValidationError::warning(
                            line_number,
                            "\"When\" before \"Given\": consider adding a context step first.",
                        )
                        .with_suggestion("Add a \"Given ...\" step before the \"When\"."),
                    );
                }
            }
            KeywordCategory::Then => {
                self.then_in_scenario = true;
                self.step_count += 1;
            }
            KeywordCategory::And | KeywordCategory::But => {
                self.step_count += 1;
            }
            KeywordCategory::Examples => {
                self.has_examples = true;
            }
        }
    }

    /// Checks the open scenario, if any, for its context and validation steps.
    fn close_scenario(&mut self, at_end_of_file: bool) {
        if !self.in_scenario {
            return;
        }
        let prefix = if at_end_of_file {
            "Last scenario"
        } else {
            "Scenario"
        };

        if !self.given_in_scenario {
            self.warnings.push(
                GherkinValidationError::warning(
                    self.last_scenario_line,
                    format!("{prefix} has no \"Given/Dado\" step: missing context."),
                )
                .with_suggestion("Add a \"Given ...\" step to establish the initial context."),
            );
        }

        if !self.then_in_scenario {
            self.errors.push(
                GherkinValidationError::error(
                    self.last_scenario_line,
                    ErrorType::Semantic,
                    format!(
                        "{prefix} has no \"Then/Então\" step: every scenario needs a validation step."
                    ),
                )
                .with_suggestion("Add at least one \"Then ...\" step to check the outcome."),
            );
        }
    }

    fn finish(&mut self, max_scenarios_per_file: usize) {
        self.close_scenario(true);

        if !self.has_feature {
            self.errors.push(
                GherkinValidationError::error(1, ErrorType::Syntax, "Feature not declared.")
                    .with_suggestion("Add \"Feature: <name>\" at the top of the file."),
            );
        }

        if !self.has_scenario {
            self.errors.push(
                GherkinValidationError::error(1, ErrorType::Syntax, "no Scenario declared.")
                    .with_suggestion("Add at least one \"Scenario: <name>\"."),
            );
        }

        if self.scenario_count > max_scenarios_per_file {
            self.warnings.push(
                GherkinValidationError::warning(
                    1,
                    format!(
                        "File has {} scenarios. Consider splitting it into multiple files.",
                        self.scenario_count
                    ),
                )
                .with_suggestion(format!(
                    "Keep at most {max_scenarios_per_file} scenarios per file for maintainability."
                )),
            );
        }
    }

    fn metrics(&self) -> GherkinMetrics {
        GherkinMetrics {
            scenario_count: self.scenario_count,
            step_count: self.step_count,
            has_background: self.has_background,
            has_examples: self.has_examples,
        }
    }
}

/// Splits Gherkin text into one raw block per scenario.
///
/// A block starts at its Scenario/Outline line and ends before the next
/// Feature, Background or Scenario line.
pub fn extract_scenarios(text: &str) -> Vec<String> {
    let mut scenarios = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut in_scenario = false;

    for line in text.lines() {
        match classify(line) {
            Some(KeywordCategory::Scenario | KeywordCategory::ScenarioOutline) => {
                if in_scenario && !current.is_empty() {
                    scenarios.push(current.join("\n"));
                }
                current = vec![line];
                in_scenario = true;
            }
            Some(KeywordCategory::Feature | KeywordCategory::Background) if in_scenario => {
                scenarios.push(current.join("\n"));
                current.clear();
                in_scenario = false;
            }
            _ if in_scenario => current.push(line),
            _ => {}
        }
    }

    if in_scenario && !current.is_empty() {
        scenarios.push(current.join("\n"));
    }

    scenarios
}

/// Counts lines starting with a step keyword followed by a space.
pub fn count_steps(text: &str) -> usize {
    text.lines()
        .filter(|line| STEP_CATEGORIES.iter().any(|c| c.starts_step(line)))
        .count()
}
