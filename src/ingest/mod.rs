/// Historical observation sources.
///
/// Submodules:
/// - `csv`      the processed daily dataset as a CSV file
/// - `postgres` daily observations stored in PostgreSQL

pub mod csv;
pub mod postgres;

use crate::model::{ForecastError, HistoricalSeries};

/// Supplies per-station daily observation series.
pub trait HistorySource {
    /// Station ids with at least one observation, sorted.
    fn station_ids(&mut self) -> Result<Vec<String>, HistoryError>;

    /// The full date-ordered series for one station.
    fn load_station(&mut self, station: &str) -> Result<HistoricalSeries, HistoryError>;
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum HistoryError {
    /// The dataset file could not be read.
    Io(String),
    /// A line of the dataset could not be parsed.
    Parse { line: usize, message: String },
    /// Database connection or query failure.
    Database(String),
    /// No observations exist for the station.
    UnknownStation(String),
    /// The rows loaded for a station do not form a valid series.
    Series(ForecastError),
}

impl std::fmt::Display for HistoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryError::Io(msg) => write!(f, "I/O error: {}", msg),
            HistoryError::Parse { line, message } => {
                write!(f, "Parse error on line {}: {}", line, message)
            }
            HistoryError::Database(msg) => write!(f, "Database error: {}", msg),
            HistoryError::UnknownStation(station) => write!(f, "No data for station: {}", station),
            HistoryError::Series(err) => write!(f, "Invalid series: {}", err),
        }
    }
}

impl std::error::Error for HistoryError {}

impl From<ForecastError> for HistoryError {
    fn from(err: ForecastError) -> Self {
        HistoryError::Series(err)
    }
}
