/// Core data types for the air-quality forecast service.
///
/// This module defines the shared domain model imported by all other modules:
/// daily observations, the per-station historical series, engineered feature
/// rows, and the error types surfaced by the forecast engine. Apart from the
/// ordering check on `HistoricalSeries` it contains no logic and no I/O.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Window and horizon constants
// ---------------------------------------------------------------------------

/// Number of forecast days produced by one forecast call.
pub const HORIZON_DAYS: usize = 7;

/// Minimum number of observations required before a forecast is attempted.
pub const MIN_FORECAST_HISTORY: usize = 40;

/// Trailing raw rows consumed by the tabular (PM2.5) model.
pub const TABULAR_WINDOW: usize = 7;

/// Trailing engineered rows consumed by the sequence (PM10) model.
pub const SEQUENCE_WINDOW: usize = 30;

/// Leading rows lost by feature engineering (lag-7 / rolling-7 warm-up).
pub const FEATURE_WARMUP: usize = 7;

/// Raw numeric columns, in the order the tabular model was trained on.
pub const RAW_COLUMNS: [&str; 5] = ["pm25", "pm10", "o3", "no2", "so2"];

/// Engineered feature columns, in the order the sequence model was trained on.
pub const FEATURE_COLUMNS: [&str; 11] = [
    "pm25",
    "o3",
    "no2",
    "so2",
    "pm10",
    "pm25_lag1",
    "pm25_lag7",
    "pm25_roll7_mean",
    "doy_sin",
    "doy_cos",
    "o3_inverse",
];

// ---------------------------------------------------------------------------
// Observation types
// ---------------------------------------------------------------------------

/// One day of pollutant readings for a station, in µg/m³.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub pm25: f64,
    pub pm10: f64,
    pub o3: f64,
    pub no2: f64,
    pub so2: f64,
}

impl Observation {
    /// Numeric fields in `RAW_COLUMNS` order.
    pub fn numeric_columns(&self) -> [f64; 5] {
        [self.pm25, self.pm10, self.o3, self.no2, self.so2]
    }

    /// True if every numeric field is a finite number.
    pub fn is_complete(&self) -> bool {
        self.numeric_columns().iter().all(|v| v.is_finite())
    }
}

/// Ordered daily observations for a single station.
///
/// Dates are strictly ascending (no duplicates). Construction validates the
/// ordering; afterwards the series can only grow at the end, and only from
/// inside the crate (the forecast loop extends its own private copy).
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalSeries {
    station: String,
    observations: Vec<Observation>,
}

impl HistoricalSeries {
    /// Builds a series, rejecting out-of-order or duplicate dates.
    pub fn new(
        station: impl Into<String>,
        observations: Vec<Observation>,
    ) -> Result<Self, ForecastError> {
        for (index, pair) in observations.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(ForecastError::MalformedSeries {
                    index: index + 1,
                    reason: format!(
                        "date {} does not follow {}",
                        pair[1].date, pair[0].date
                    ),
                });
            }
        }
        Ok(Self {
            station: station.into(),
            observations,
        })
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// The observation recorded on `date`, if any.
    pub fn on(&self, date: NaiveDate) -> Option<&Observation> {
        self.observations
            .binary_search_by_key(&date, |o| o.date)
            .ok()
            .map(|i| &self.observations[i])
    }

    /// The prefix of the series strictly before `date`.
    pub fn before(&self, date: NaiveDate) -> HistoricalSeries {
        let end = self.observations.partition_point(|o| o.date < date);
        HistoricalSeries {
            station: self.station.clone(),
            observations: self.observations[..end].to_vec(),
        }
    }

    /// Appends an observation dated after the current last one.
    pub(crate) fn append(&mut self, observation: Observation) -> Result<(), ForecastError> {
        if let Some(last) = self.observations.last() {
            if observation.date <= last.date {
                return Err(ForecastError::MalformedSeries {
                    index: self.observations.len(),
                    reason: format!(
                        "appended date {} does not follow {}",
                        observation.date, last.date
                    ),
                });
            }
        }
        self.observations.push(observation);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Feature types
// ---------------------------------------------------------------------------

/// One engineered row, derived from an observation and the seven before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub pm25: f64,
    pub o3: f64,
    pub no2: f64,
    pub so2: f64,
    pub pm10: f64,
    pub pm25_lag1: f64,
    pub pm25_lag7: f64,
    pub pm25_roll7_mean: f64,
    pub doy_sin: f64,
    pub doy_cos: f64,
    pub o3_inverse: f64,
}

impl FeatureRow {
    /// Feature values in `FEATURE_COLUMNS` order.
    pub fn to_vector(&self) -> [f64; 11] {
        [
            self.pm25,
            self.o3,
            self.no2,
            self.so2,
            self.pm10,
            self.pm25_lag1,
            self.pm25_lag7,
            self.pm25_roll7_mean,
            self.doy_sin,
            self.doy_cos,
            self.o3_inverse,
        ]
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Which of the two predictive models an invocation failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Tabular,
    Sequence,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Tabular => write!(f, "tabular PM2.5 model"),
            ModelKind::Sequence => write!(f, "sequence PM10 model"),
        }
    }
}

/// Errors reported by model and scaler implementations.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Input or artifact dimensions disagree.
    ShapeMismatch { expected: usize, found: usize },
    /// The model produced NaN or an infinite value.
    NonFinite(String),
    /// The backing implementation failed (HTTP error, bad response, ...).
    Backend(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::ShapeMismatch { expected, found } => {
                write!(f, "shape mismatch: expected {}, found {}", expected, found)
            }
            ModelError::NonFinite(what) => write!(f, "non-finite output: {}", what),
            ModelError::Backend(msg) => write!(f, "backend error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

/// Errors surfaced by the forecast engine.
///
/// None of these are downgraded to default predictions; a failed forecast
/// returns no partial steps.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Not enough rows to run the requested operation.
    InsufficientHistory { required: usize, available: usize },
    /// A model input window is short or contains missing/malformed values.
    InvalidWindow(String),
    /// A model or one of its scalers failed during prediction.
    ModelInvocationFailure { model: ModelKind, message: String },
    /// Input observations are not strictly ascending by date.
    MalformedSeries { index: usize, reason: String },
    /// The caller requested cancellation before the forecast completed.
    Cancelled { completed_days: usize },
}

impl ForecastError {
    pub(crate) fn model(model: ModelKind, err: ModelError) -> Self {
        ForecastError::ModelInvocationFailure {
            model,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for ForecastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastError::InsufficientHistory { required, available } => write!(
                f,
                "Insufficient history: {} rows required, {} available",
                required, available
            ),
            ForecastError::InvalidWindow(msg) => write!(f, "Invalid window: {}", msg),
            ForecastError::ModelInvocationFailure { model, message } => {
                write!(f, "Model invocation failed ({}): {}", model, message)
            }
            ForecastError::MalformedSeries { index, reason } => {
                write!(f, "Malformed series at row {}: {}", index, reason)
            }
            ForecastError::Cancelled { completed_days } => {
                write!(f, "Forecast cancelled after {} day(s)", completed_days)
            }
        }
    }
}

impl std::error::Error for ForecastError {}
