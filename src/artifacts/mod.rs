//! Model and scaler interfaces, plus the concrete artifacts the service loads.
//!
//! The forecast engine only sees the three traits below. Loading, caching
//! and releasing the concrete artifacts is the caller's business; the engine
//! receives already-loaded handles.
//!
//! Submodules:
//! - `scaler`  standard and min-max scalers
//! - `linear`  linear tabular and sequence regressors
//! - `remote`  HTTP client for a served sequence model
//! - `loader`  per-station artifact files

pub mod linear;
pub mod loader;
pub mod remote;
pub mod scaler;

pub use linear::{LinearRegressor, LinearSequenceModel};
pub use loader::{SequenceModelArtifact, StationArtifacts};
pub use remote::RemoteSequenceModel;
pub use scaler::ScalerArtifact;

use crate::model::ModelError;

/// Row-major matrix: one inner vector per row.
pub type Matrix = Vec<Vec<f64>>;

/// A fitted per-column transform.
pub trait Scaler {
    /// Scales every row of `rows`.
    fn transform(&self, rows: &[Vec<f64>]) -> Result<Matrix, ModelError>;

    /// Maps one scaled row back to original units.
    fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>, ModelError>;
}

/// A regressor over a flat feature vector, returning one scaled value.
pub trait TabularRegressor {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError>;
}

/// A regressor over one time-ordered window of feature rows.
///
/// Returns one log-space residual per forecast day it was trained for:
/// a single value for step-at-a-time models, several for multi-day models.
pub trait SequenceRegressor {
    fn predict(&self, window: &[Vec<f64>]) -> Result<Vec<f64>, ModelError>;
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when loading a station's model artifacts.
#[derive(Debug)]
pub enum ArtifactError {
    /// The artifact file could not be read.
    Io { path: String, message: String },
    /// The artifact file is not valid JSON for its type.
    Parse { path: String, message: String },
    /// The artifact has the wrong number of columns/coefficients.
    Shape {
        path: String,
        expected: usize,
        found: usize,
    },
    /// No local sequence model exists and no endpoint is configured.
    MissingSequenceModel(String),
    /// The HTTP client for a remote model could not be built.
    Client(String),
}

impl std::fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactError::Io { path, message } => {
                write!(f, "Cannot read artifact {}: {}", path, message)
            }
            ArtifactError::Parse { path, message } => {
                write!(f, "Cannot parse artifact {}: {}", path, message)
            }
            ArtifactError::Shape {
                path,
                expected,
                found,
            } => write!(
                f,
                "Artifact {} has {} columns, expected {}",
                path, found, expected
            ),
            ArtifactError::MissingSequenceModel(station) => write!(
                f,
                "No sequence model for station {}: no local file and no endpoint configured",
                station
            ),
            ArtifactError::Client(msg) => write!(f, "HTTP client error: {}", msg),
        }
    }
}

impl std::error::Error for ArtifactError {}
