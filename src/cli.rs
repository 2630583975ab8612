use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

use qapipe::config::{Config, OutputFormat};
use qapipe::confirmation::{
    create_log_entry_at, generate_confirmation, generate_consolidated_report, PipelineAction,
    PipelineConfirmation, PipelineConfirmationEntry,
};
use qapipe::documents::{load_confirmations, RejectedEvent, ReplayDocument};
use qapipe::gherkin::{count_steps, extract_scenarios, GherkinValidationResult};
use qapipe::stage::PipelineStage;
use qapipe::tracker::ExecutionStatus;

use crate::output;

#[derive(Parser)]
#[command(name = "qapipe")]
#[command(author, version, about = "QA Test Pipeline Toolkit", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./qapipe.toml and friends)
    #[arg(long, global = true, env = "QAPIPE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    /// Emit JSON instead of the human-readable summary
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a Gherkin feature file
    Validate { file: PathBuf },

    /// List the scenario blocks of a feature file
    Scenarios { file: PathBuf },

    /// Show the stage transition table
    Transitions,

    /// Replay recorded stage events and build a confirmation
    Replay {
        file: PathBuf,

        /// Feature file to attach as validation details
        #[arg(short, long)]
        gherkin: Option<PathBuf>,

        /// Evidence link (screenshot, video or report)
        #[arg(short, long)]
        evidence: Option<String>,
    },

    /// Consolidate saved confirmations into one report
    Report {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioListing<'a> {
    scenarios: &'a [String],
    step_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransitionRow {
    stage: PipelineStage,
    allowed: &'static [PipelineStage],
    status: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayOutput<'a> {
    status: &'a ExecutionStatus,
    rejected: &'a [RejectedEvent],
    audit_log: &'a [PipelineConfirmationEntry],
    confirmation: &'a PipelineConfirmation,
}

impl Cli {
    fn wants_json(&self, config: &Config) -> bool {
        self.json || config.output.format == OutputFormat::Json
    }

    fn to_json<T: Serialize>(&self, config: &Config, value: &T) -> Result<String> {
        let json = if self.pretty || config.output.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }

    fn emit(&self, rendered: &str) -> Result<()> {
        if let Some(output_path) = &self.output {
            std::fs::write(output_path, console::strip_ansi_codes(rendered).as_bytes())
                .with_context(|| format!("Failed to write output: {}", output_path.display()))?;
            info!("Output written to: {}", output_path.display());
        } else {
            println!("{rendered}");
        }
        Ok(())
    }

    fn execute_validate(&self, config: &Config, file: &Path) -> Result<()> {
        info!("Validating Gherkin file: {}", file.display());

        let result = validate_file(config, file)?;

        let rendered = if self.wants_json(config) {
            self.to_json(config, &result)?
        } else {
            output::render_validation(&file.display().to_string(), &result)
        };
        self.emit(&rendered)?;

        if !result.is_valid {
            bail!(
                "{} is not valid Gherkin ({} error(s))",
                file.display(),
                result.errors.len()
            );
        }
        Ok(())
    }

    fn execute_scenarios(&self, config: &Config, file: &Path) -> Result<()> {
        let text = read_text(file)?;
        let scenarios = extract_scenarios(&text);
        let step_count = count_steps(&text);
        info!(
            "Found {} scenario(s) in {}",
            scenarios.len(),
            file.display()
        );

        let rendered = if self.wants_json(config) {
            self.to_json(
                config,
                &ScenarioListing {
                    scenarios: &scenarios,
                    step_count,
                },
            )?
        } else {
            output::render_scenarios(&scenarios, step_count)
        };
        self.emit(&rendered)
    }

    fn execute_transitions(&self, config: &Config) -> Result<()> {
        let rendered = if self.wants_json(config) {
            let rows: Vec<_> = PipelineStage::ALL
                .into_iter()
                .map(|stage| TransitionRow {
                    stage,
                    allowed: stage.allowed_transitions(),
                    status: stage.status().label(),
                })
                .collect();
            self.to_json(config, &rows)?
        } else {
            output::render_transitions()
        };
        self.emit(&rendered)
    }

    fn execute_replay(
        &self,
        config: &Config,
        file: &Path,
        gherkin: Option<&Path>,
        evidence: Option<&str>,
    ) -> Result<()> {
        info!("Replaying pipeline events from: {}", file.display());

        let document = ReplayDocument::from_path(file)
            .with_context(|| format!("Failed to load replay document: {}", file.display()))?;
        let mut result = document.replay(&config.tracker)?;

        let validation = gherkin.map(|path| validate_file(config, path)).transpose()?;
        let confirmation = generate_confirmation(
            &document.row_id,
            &result.status,
            validation.as_ref(),
            evidence,
        );
        if let Some(evidence) = &confirmation.details.evidence {
            result.audit_log.push(create_log_entry_at(
                PipelineAction::EvidenceUploaded,
                format!("{} evidence: {}", evidence.kind.as_str(), evidence.url),
                None,
                evidence.uploaded_at,
            ));
        }
        info!(
            "{}: {} confirmation generated",
            document.row_id,
            confirmation.kind.as_str()
        );

        let rendered = if self.wants_json(config) {
            self.to_json(
                config,
                &ReplayOutput {
                    status: &result.status,
                    rejected: &result.rejected,
                    audit_log: &result.audit_log,
                    confirmation: &confirmation,
                },
            )?
        } else {
            output::render_replay(&result, &confirmation)
        };
        self.emit(&rendered)
    }

    fn execute_report(&self, files: &[PathBuf]) -> Result<()> {
        let mut confirmations = Vec::new();
        for file in files {
            let loaded = load_confirmations(file)
                .with_context(|| format!("Failed to load confirmations: {}", file.display()))?;
            info!(
                "Loaded {} confirmation(s) from {}",
                loaded.len(),
                file.display()
            );
            confirmations.extend(loaded);
        }

        self.emit(&generate_consolidated_report(&confirmations))
    }

    pub fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Validate { file } => self.execute_validate(&config, file),
            Commands::Scenarios { file } => self.execute_scenarios(&config, file),
            Commands::Transitions => self.execute_transitions(&config),
            Commands::Replay {
                file,
                gherkin,
                evidence,
            } => self.execute_replay(&config, file, gherkin.as_deref(), evidence.as_deref()),
            Commands::Report { files } => self.execute_report(files),
        }
    }
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn validate_file(config: &Config, path: &Path) -> Result<GherkinValidationResult> {
    let text = read_text(path)?;
    Ok(config.validator.validator().validate(&text))
}
