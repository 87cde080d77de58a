use chrono::{DateTime, NaiveDateTime};
use config::{Config, ConfigError};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

use crate::{Error, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    /// Instant the user day counts are measured from. Wall-clock time at run
    /// start when unset.
    #[serde(default)]
    pub reference_time: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            preview_rows: default_preview_rows(),
            reference_time: None,
            logging: LoggingConfig::default(),
        }
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_preview_rows() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Loads settings from `path` (any format the `config` crate knows, the
    /// file is optional) and then from `ETL_*` environment variables.
    pub fn new(path: &str) -> std::result::Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("ETL")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;

        debug!(
            input_dir = %settings.input_dir.display(),
            output_dir = %settings.output_dir.display(),
            reference_time = ?settings.reference_time,
            "Loaded ETL settings"
        );

        Ok(settings)
    }

    /// Parses `reference_time` into a timezone-naive UTC instant.
    pub fn reference_instant(&self) -> Result<Option<NaiveDateTime>> {
        let Some(raw) = self.reference_time.as_deref() else {
            return Ok(None);
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(dt.naive_utc()));
        }
        ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(Some)
            .ok_or_else(|| Error::InvalidInput(format!("reference_time '{}' is not a timestamp", raw)))
    }
}
