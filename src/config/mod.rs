use anyhow::Result;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub roster: RosterConfig,
}

/// Where and how the guide is written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Destination of the XMLTV document; the temp file lives next to it
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    /// chrono format used for every start/stop attribute in the document
    #[serde(default = "default_output_time_format")]
    pub time_format: String,
}

/// Schedule provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request deadline, e.g. "20s"
    #[serde(default = "default_request_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
    #[serde(default)]
    pub format: SourceFormat,
    /// chrono format of the provider's start timestamps
    #[serde(default = "default_start_time_format")]
    pub start_time_format: String,
}

/// How schedule entries are extracted from the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// `tv_schedules/{name}.json` array endpoint
    #[default]
    Json,
    /// `data-*` attributes scraped from the channel page
    Html,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Maximum number of channels fetched at once, 0 for no cap
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub invalid_duration: InvalidDurationPolicy,
}

/// What to do with an entry whose duration is not a number of minutes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidDurationPolicy {
    /// Keep the entry as a zero-length slot
    #[default]
    Zero,
    /// Drop the entry like an unparseable start time
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default = "default_roster_path")]
    pub path: PathBuf,
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

fn default_output_time_format() -> String {
    DEFAULT_OUTPUT_TIME_FORMAT.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
}

fn default_start_time_format() -> String {
    DEFAULT_START_TIME_FORMAT.to_string()
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_roster_path() -> PathBuf {
    PathBuf::from(DEFAULT_ROSTER_PATH)
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            time_format: default_output_time_format(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            request_timeout: default_request_timeout(),
            format: SourceFormat::default(),
            start_time_format: default_start_time_format(),
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            invalid_duration: InvalidDurationPolicy::default(),
        }
    }
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            path: default_roster_path(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        let config = if Path::new(config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            default_config
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would only fail later, once per channel
    pub fn validate(&self) -> Result<()> {
        validate_time_format("output.time_format", &self.output.time_format)?;
        validate_time_format("source.start_time_format", &self.source.start_time_format)?;
        url::Url::parse(&self.source.base_url)
            .map_err(|e| {
                anyhow::anyhow!("source.base_url '{}' is invalid: {}", self.source.base_url, e)
            })?;
        if self.source.request_timeout.is_zero() {
            anyhow::bail!("source.request_timeout must be greater than zero");
        }
        Ok(())
    }
}

/// Formats chrono cannot render would make every timestamp fail to format
fn validate_time_format(field: &str, format: &str) -> Result<()> {
    if format.trim().is_empty() {
        anyhow::bail!("{} must not be empty", field);
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        anyhow::bail!("{} '{}' is not a valid time format", field, format);
    }
    Ok(())
}
