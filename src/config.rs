//! Service configuration.
//!
//! Loaded from a TOML file. Every section and key is optional; missing
//! values take the defaults below. The database URL is not part of the
//! file: it is read from `DATABASE_URL` (see `ingest::postgres`).
//!
//! ```toml
//! [history]
//! source = "csv"                      # or "postgres"
//! csv_path = "dataset/aqi_dataset_processed.csv"
//! table = "aqi.daily_observations"
//!
//! [artifacts]
//! dir = "models"
//! sequence_endpoint = "http://localhost:8501"
//! timeout_secs = 10
//!
//! [forecast]
//! residual_mode = "per_step"          # or "batch"
//! display_precision = 1
//!
//! [logging]
//! level = "info"
//! file = "airq.log"
//! timestamps = false
//!
//! [[stations]]
//! id = "Bjelave"
//! name = "Sarajevo - Bjelave"
//! ```

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::forecast::ResidualMode;
use crate::logging::LogLevel;
use crate::stations::Station;

/// Upper bound on display rounding; beyond this rounding is meaningless.
const MAX_DISPLAY_PRECISION: u32 = 6;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub history: HistorySettings,
    pub artifacts: ArtifactSettings,
    pub forecast: ForecastSettings,
    pub logging: LoggingSettings,
    pub stations: Vec<Station>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    #[default]
    Csv,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub source: HistoryBackend,
    pub csv_path: PathBuf,
    pub table: String,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            source: HistoryBackend::Csv,
            csv_path: PathBuf::from("dataset/aqi_dataset_processed.csv"),
            table: "aqi.daily_observations".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactSettings {
    pub dir: PathBuf,
    pub sequence_endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl ArtifactSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ArtifactSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            sequence_endpoint: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    pub residual_mode: ResidualMode,
    pub display_precision: u32,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            residual_mode: ResidualMode::PerStep,
            display_precision: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub file: Option<String>,
    pub timestamps: bool,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, message: String },
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "Cannot read config {}: {}", path, message)
            }
            ConfigError::Parse(msg) => write!(f, "Invalid config syntax: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Reads and validates the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_config(&text)
}

/// Parses and validates configuration text.
pub fn parse_config(text: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig =
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ServiceConfig) -> Result<(), ConfigError> {
    if config.forecast.display_precision > MAX_DISPLAY_PRECISION {
        return Err(ConfigError::Invalid(format!(
            "forecast.display_precision must be at most {}, got {}",
            MAX_DISPLAY_PRECISION, config.forecast.display_precision
        )));
    }
    if config.artifacts.timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "artifacts.timeout_secs must be positive".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for station in &config.stations {
        if station.id.trim().is_empty() {
            return Err(ConfigError::Invalid("station with empty id".to_string()));
        }
        if !seen.insert(station.id.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "duplicate station id '{}'",
                station.id
            )));
        }
    }
    Ok(())
}
