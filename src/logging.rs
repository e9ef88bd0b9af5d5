/// Structured logging for the air-quality forecast service
///
/// Provides context-rich logging with component and station identifiers,
/// timestamps, and severity levels. Supports both console output and
/// file-based logging for unattended runs. The forecast engine itself never
/// logs; the service layer reports what happened around it.

use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::ingest::HistoryError;
use crate::model::ForecastError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    History,
    Artifacts,
    Forecast,
    Backtest,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::History => write!(f, "HIST"),
            Component::Artifacts => write!(f, "MODEL"),
            Component::Forecast => write!(f, "FCST"),
            Component::Backtest => write!(f, "BTST"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - e.g. a station without enough history yet
    Expected,
    /// Unexpected failure - a model, artifact or service problem
    Unexpected,
    /// Unknown - usually a data-quality issue worth a look
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    fn log(&self, level: LogLevel, component: &Component, station: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let station_part = station.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, component, station_part, message
        );

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, station_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, station_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    let logger = Logger {
        min_level,
        log_file: log_file.map(String::from),
        console_timestamps,
    };
    if let Ok(mut guard) = LOGGER.lock() {
        *guard = Some(logger);
    }
}

fn dispatch(level: LogLevel, component: Component, station: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &component, station, message);
        }
    }
}

/// Log a general informational message
pub fn info(component: Component, station: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, component, station, message);
}

/// Log a warning message
pub fn warn(component: Component, station: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, component, station, message);
}

/// Log an error message
pub fn error(component: Component, station: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, component, station, message);
}

/// Log a debug message
pub fn debug(component: Component, station: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, component, station, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a forecast failure by how surprising it is.
pub fn classify_forecast_failure(err: &ForecastError) -> FailureType {
    match err {
        // New or sparse stations simply lack history; cancellation is requested.
        ForecastError::InsufficientHistory { .. } | ForecastError::Cancelled { .. } => {
            FailureType::Expected
        }
        ForecastError::InvalidWindow(_) | ForecastError::MalformedSeries { .. } => {
            FailureType::Unknown
        }
        ForecastError::ModelInvocationFailure { .. } => FailureType::Unexpected,
    }
}

/// Classify a history-source failure.
pub fn classify_history_failure(err: &HistoryError) -> FailureType {
    match err {
        HistoryError::UnknownStation(_) => FailureType::Expected,
        HistoryError::Parse { .. } | HistoryError::Series(_) => FailureType::Unknown,
        HistoryError::Io(_) | HistoryError::Database(_) => FailureType::Unexpected,
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

fn log_classified(
    component: Component,
    station: &str,
    operation: &str,
    failure_type: FailureType,
    err: &dyn std::error::Error,
) {
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);
    match failure_type {
        FailureType::Expected => debug(component, Some(station), &message),
        FailureType::Unexpected => error(component, Some(station), &message),
        FailureType::Unknown => warn(component, Some(station), &message),
    }
}

/// Log a forecast or backtest failure with automatic classification
pub fn log_forecast_failure(
    component: Component,
    station: &str,
    operation: &str,
    err: &ForecastError,
) {
    log_classified(component, station, operation, classify_forecast_failure(err), err);
}

/// Log a history-source failure with automatic classification
pub fn log_history_failure(station: &str, operation: &str, err: &HistoryError) {
    log_classified(
        Component::History,
        station,
        operation,
        classify_history_failure(err),
        err,
    );
}

// ---------------------------------------------------------------------------
// Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a multi-station run (e.g. verification)
pub fn log_run_summary(component: Component, total: usize, successful: usize, failed: usize) {
    let message = format!(
        "Run complete: {}/{} successful, {} failed",
        successful, total, failed
    );

    if failed == 0 {
        info(component, None, &message);
    } else if successful == 0 {
        error(component, None, &message);
    } else {
        warn(component, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelKind;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_deserializes_from_config_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            level: LogLevel,
        }
        let parsed: Wrapper = toml::from_str("level = \"warn\"").unwrap();
        assert_eq!(parsed.level, LogLevel::Warning);
        let parsed: Wrapper = toml::from_str("level = \"debug\"").unwrap();
        assert_eq!(parsed.level, LogLevel::Debug);
    }

    #[test]
    fn test_forecast_failure_classification() {
        let err = ForecastError::InsufficientHistory {
            required: 40,
            available: 12,
        };
        assert_eq!(classify_forecast_failure(&err), FailureType::Expected);

        let err = ForecastError::ModelInvocationFailure {
            model: ModelKind::Sequence,
            message: "HTTP error: 500".to_string(),
        };
        assert_eq!(classify_forecast_failure(&err), FailureType::Unexpected);

        let err = ForecastError::InvalidWindow("NaN".to_string());
        assert_eq!(classify_forecast_failure(&err), FailureType::Unknown);
    }

    #[test]
    fn test_history_failure_classification() {
        assert_eq!(
            classify_history_failure(&HistoryError::UnknownStation("X".into())),
            FailureType::Expected
        );
        assert_eq!(
            classify_history_failure(&HistoryError::Database("refused".into())),
            FailureType::Unexpected
        );
    }

    #[test]
    fn test_file_logging_appends_entries() {
        let path = std::env::temp_dir().join(format!("airq_log_{}.log", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let logger = Logger {
            min_level: LogLevel::Info,
            log_file: Some(path.display().to_string()),
            console_timestamps: true,
        };
        logger.log(LogLevel::Debug, &Component::System, None, "hidden");
        logger.log(LogLevel::Warning, &Component::Forecast, Some("S1"), "visible");
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("hidden"));
        assert!(contents.contains("WARN FCST [S1]: visible"));
        let _ = std::fs::remove_file(&path);
    }
}
