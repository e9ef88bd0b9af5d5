/// Per-station artifact loading.
///
/// Each station has its own fitted models. Files live side by side in the
/// artifact directory, suffixed with the station id:
///
///   tabular_model_<id>.json      LinearRegressor over 7×5 flattened inputs
///   tabular_x_scaler_<id>.json   ScalerArtifact, 5 columns
///   tabular_y_scaler_<id>.json   ScalerArtifact, 1 column
///   sequence_scaler_<id>.json    ScalerArtifact, 11 columns
///   sequence_model_<id>.json     LinearSequenceModel (optional)
///
/// When `sequence_model_<id>.json` is absent the sequence model is served
/// remotely as `pm10_<id>` at the configured endpoint.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{
    ArtifactError, LinearRegressor, LinearSequenceModel, RemoteSequenceModel, ScalerArtifact,
    SequenceRegressor,
};
use crate::forecast::ForecastModels;
use crate::model::{
    FEATURE_COLUMNS, ModelError, RAW_COLUMNS, SEQUENCE_WINDOW, TABULAR_WINDOW,
};

/// Either a local coefficient file or a served model.
pub enum SequenceModelArtifact {
    Local(LinearSequenceModel),
    Remote(RemoteSequenceModel),
}

impl SequenceRegressor for SequenceModelArtifact {
    fn predict(&self, window: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        match self {
            SequenceModelArtifact::Local(model) => model.predict(window),
            SequenceModelArtifact::Remote(model) => model.predict(window),
        }
    }
}

/// All fitted artifacts for one station.
pub struct StationArtifacts {
    pub station: String,
    pub tabular: LinearRegressor,
    pub tabular_x_scaler: ScalerArtifact,
    pub tabular_y_scaler: ScalerArtifact,
    pub sequence: SequenceModelArtifact,
    pub sequence_scaler: ScalerArtifact,
}

impl StationArtifacts {
    /// Loads and shape-checks every artifact for `station`.
    pub fn load(
        dir: &Path,
        station: &str,
        sequence_endpoint: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ArtifactError> {
        let tabular_path = artifact_path(dir, "tabular_model", station);
        let tabular: LinearRegressor = read_json(&tabular_path)?;
        expect_width(
            &tabular_path,
            TABULAR_WINDOW * RAW_COLUMNS.len(),
            tabular.coefficients.len(),
        )?;

        let tabular_x_scaler = read_scaler(dir, "tabular_x_scaler", station, RAW_COLUMNS.len())?;
        let tabular_y_scaler = read_scaler(dir, "tabular_y_scaler", station, 1)?;
        let sequence_scaler =
            read_scaler(dir, "sequence_scaler", station, FEATURE_COLUMNS.len())?;

        let local_path = artifact_path(dir, "sequence_model", station);
        let sequence = if local_path.exists() {
            let model: LinearSequenceModel = read_json(&local_path)?;
            let width = SEQUENCE_WINDOW * FEATURE_COLUMNS.len();
            for head in &model.weights {
                expect_width(&local_path, width, head.len())?;
            }
            expect_width(&local_path, model.weights.len(), model.intercepts.len())?;
            if model.outputs() == 0 {
                return Err(ArtifactError::Shape {
                    path: local_path.display().to_string(),
                    expected: 1,
                    found: 0,
                });
            }
            SequenceModelArtifact::Local(model)
        } else {
            let endpoint = sequence_endpoint
                .ok_or_else(|| ArtifactError::MissingSequenceModel(station.to_string()))?;
            let name = format!("pm10_{}", station);
            SequenceModelArtifact::Remote(RemoteSequenceModel::new(endpoint, &name, timeout)?)
        };

        Ok(Self {
            station: station.to_string(),
            tabular,
            tabular_x_scaler,
            tabular_y_scaler,
            sequence,
            sequence_scaler,
        })
    }

    /// Borrows the artifacts as forecast-engine handles.
    pub fn models(&self) -> ForecastModels<'_> {
        ForecastModels {
            tabular: &self.tabular,
            tabular_input_scaler: &self.tabular_x_scaler,
            tabular_output_scaler: &self.tabular_y_scaler,
            sequence: &self.sequence,
            sequence_scaler: &self.sequence_scaler,
        }
    }
}

/// `<dir>/<prefix>_<station>.json`
pub fn artifact_path(dir: &Path, prefix: &str, station: &str) -> PathBuf {
    dir.join(format!("{}_{}.json", prefix, station))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let text = std::fs::read_to_string(path).map_err(|e| ArtifactError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| ArtifactError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn read_scaler(
    dir: &Path,
    prefix: &str,
    station: &str,
    columns: usize,
) -> Result<ScalerArtifact, ArtifactError> {
    let path = artifact_path(dir, prefix, station);
    let scaler: ScalerArtifact = read_json(&path)?;
    scaler.validate().map_err(|e| ArtifactError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    expect_width(&path, columns, scaler.columns())?;
    Ok(scaler)
}

fn expect_width(path: &Path, expected: usize, found: usize) -> Result<(), ArtifactError> {
    if expected != found {
        return Err(ArtifactError::Shape {
            path: path.display().to_string(),
            expected,
            found,
        });
    }
    Ok(())
}
