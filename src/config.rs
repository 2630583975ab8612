use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::QaPipeError;
use crate::gherkin::Validator;
use crate::stage::PipelineStage;
use crate::tracker::DEFAULT_MAX_RETRIES;

/// Configuration file structure for qapipe.
///
/// Lets a team pin its retry budget, starting stage and validator thresholds
/// instead of passing them on every run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Stage tracker defaults
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Gherkin validator thresholds
    #[serde(default)]
    pub validator: ValidatorConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TrackerConfig {
    /// Retries allowed from `failed` before an item is permanently failed
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Stage a newly tracked item starts in
    #[serde(default = "default_initial_stage")]
    pub initial_stage: PipelineStage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ValidatorConfig {
    /// Scenario count above which a file gets a "split me" warning
    #[serde(default = "default_max_scenarios_per_file")]
    pub max_scenarios_per_file: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_stage: default_initial_stage(),
        }
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_scenarios_per_file: default_max_scenarios_per_file(),
        }
    }
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_initial_stage() -> PipelineStage {
    PipelineStage::AwaitingGherkin
}

fn default_max_scenarios_per_file() -> usize {
    crate::gherkin::DEFAULT_MAX_SCENARIOS_PER_FILE
}

impl ValidatorConfig {
    pub fn validator(&self) -> Validator {
        Validator::new(self.max_scenarios_per_file)
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./qapipe.toml
    /// 3. ./qapipe.json
    /// 4. ./qapipe.yaml
    /// 5. ./qapipe.yml
    /// 6. `<user config dir>/qapipe/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = ["qapipe.toml", "qapipe.json", "qapipe.yaml", "qapipe.yml"]
            .into_iter()
            .map(PathBuf::from)
            .chain(user_config_file());

        for candidate in candidates {
            if candidate.exists() {
                return Self::load_from_path(&candidate);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        let config: Self = match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.validator.max_scenarios_per_file == 0 {
            return Err(QaPipeError::Config(
                "max-scenarios-per-file must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml" | "yml") => serde_yaml::to_string(self)?,
            _ => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("qapipe").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tracker.max_retries, 3);
        assert_eq!(config.tracker.initial_stage, PipelineStage::AwaitingGherkin);
        assert_eq!(config.validator.max_scenarios_per_file, 10);
        assert_eq!(config.output.format, OutputFormat::Summary);
        assert!(!config.output.pretty);
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[tracker]
max-retries = 5
initial-stage = "gherkin_validated"

[validator]
max-scenarios-per-file = 20

[output]
format = "json"
pretty = true
"#;
        write!(temp_file, "{toml_content}").unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.tracker.max_retries, 5);
        assert_eq!(
            config.tracker.initial_stage,
            PipelineStage::GherkinValidated
        );
        assert_eq!(config.validator.max_scenarios_per_file, 20);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_load_json_config_with_partial_sections() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, r#"{{ "tracker": {{ "max-retries": 1 }} }}"#).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.tracker.max_retries, 1);
        assert_eq!(config.tracker.initial_stage, PipelineStage::AwaitingGherkin);
        assert_eq!(config.validator.max_scenarios_per_file, 10);
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(temp_file, "validator:\n  max-scenarios-per-file: 4\n").unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.validator.max_scenarios_per_file, 4);
    }

    #[test]
    fn test_unknown_extension_falls_back_through_formats() {
        let mut temp_file = NamedTempFile::with_suffix(".conf").unwrap();
        write!(temp_file, r#"{{ "output": {{ "format": "json" }} }}"#).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_rejects_unknown_stage() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "[tracker]\ninitial-stage = \"deployed\"\n").unwrap();

        assert!(Config::load_from_path(temp_file.path()).is_err());
    }

    #[test]
    fn test_rejects_zero_scenario_threshold() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "[validator]\nmax-scenarios-per-file = 0\n").unwrap();

        let err = Config::load_from_path(temp_file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("at least 1"));
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        assert!(Config::load(Some(Path::new("does-not-exist.toml"))).is_err());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["qapipe.toml", "qapipe.json", "qapipe.yaml"] {
            let path = dir.path().join(name);
            let mut config = Config::default();
            config.tracker.max_retries = 7;
            config.output.format = OutputFormat::Json;
            config.save(&path).unwrap();

            let reloaded = Config::load(Some(&path)).unwrap();
            assert_eq!(reloaded.tracker.max_retries, 7);
            assert_eq!(reloaded.output.format, OutputFormat::Json);
        }
    }
}
