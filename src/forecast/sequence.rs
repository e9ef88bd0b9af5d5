//! PM10 adapter around the pretrained sequence-residual model.
//!
//! The model predicts a correction in log1p space rather than an absolute
//! concentration:
//!
//!   pm10 = expm1(log1p(last_pm10) + residual)
//!
//! A zero residual reproduces the last observed value.

use crate::artifacts::{Scaler, SequenceRegressor};
use crate::model::{
    FEATURE_COLUMNS, FeatureRow, ForecastError, ModelError, ModelKind, SEQUENCE_WINDOW,
};

/// Applies a log-space residual to the last known PM10 value.
pub fn reconstruct_pm10(last_pm10: f64, residual: f64) -> f64 {
    (last_pm10.ln_1p() + residual).exp_m1()
}

pub struct SequenceForecaster<'a> {
    model: &'a dyn SequenceRegressor,
    scaler: &'a dyn Scaler,
}

impl<'a> SequenceForecaster<'a> {
    pub fn new(model: &'a dyn SequenceRegressor, scaler: &'a dyn Scaler) -> Self {
        Self { model, scaler }
    }

    /// Runs the model on the trailing 30 feature rows.
    ///
    /// Returns every residual the model emits (at least `min_outputs`).
    pub fn predict_residuals(
        &self,
        features: &[FeatureRow],
        min_outputs: usize,
    ) -> Result<Vec<f64>, ForecastError> {
        if features.len() < SEQUENCE_WINDOW {
            return Err(ForecastError::InvalidWindow(format!(
                "sequence window needs {} feature rows, {} available",
                SEQUENCE_WINDOW,
                features.len()
            )));
        }
        let window = &features[features.len() - SEQUENCE_WINDOW..];
        if let Some(bad) = window
            .iter()
            .find(|r| r.to_vector().iter().any(|v| !v.is_finite()))
        {
            return Err(ForecastError::InvalidWindow(format!(
                "feature row on {} has a missing or non-finite value",
                bad.date
            )));
        }
        let rows: Vec<Vec<f64>> = window.iter().map(|r| r.to_vector().to_vec()).collect();

        let scaled = self
            .scaler
            .transform(&rows)
            .map_err(|e| ForecastError::model(ModelKind::Sequence, e))?;
        if let Some(row) = scaled.iter().find(|r| r.len() != FEATURE_COLUMNS.len()) {
            return Err(ForecastError::model(
                ModelKind::Sequence,
                ModelError::ShapeMismatch {
                    expected: FEATURE_COLUMNS.len(),
                    found: row.len(),
                },
            ));
        }

        let residuals = self
            .model
            .predict(&scaled)
            .map_err(|e| ForecastError::model(ModelKind::Sequence, e))?;
        if residuals.len() < min_outputs {
            return Err(ForecastError::model(
                ModelKind::Sequence,
                ModelError::ShapeMismatch {
                    expected: min_outputs,
                    found: residuals.len(),
                },
            ));
        }
        if let Some(bad) = residuals.iter().find(|r| !r.is_finite()) {
            return Err(ForecastError::model(
                ModelKind::Sequence,
                ModelError::NonFinite(format!("residual {}", bad)),
            ));
        }
        Ok(residuals)
    }

    /// Predicts the next day's PM10 from a single residual.
    pub fn predict_pm10(&self, features: &[FeatureRow]) -> Result<f64, ForecastError> {
        let residuals = self.predict_residuals(features, 1)?;
        let last_pm10 = last_pm10(features)?;
        finite_pm10(reconstruct_pm10(last_pm10, residuals[0]))
    }
}

/// PM10 of the most recent feature row.
pub(crate) fn last_pm10(features: &[FeatureRow]) -> Result<f64, ForecastError> {
    features
        .last()
        .map(|r| r.pm10)
        .ok_or_else(|| ForecastError::InvalidWindow("no feature rows".to_string()))
}

pub(crate) fn finite_pm10(pm10: f64) -> Result<f64, ForecastError> {
    if !pm10.is_finite() {
        return Err(ForecastError::model(
            ModelKind::Sequence,
            ModelError::NonFinite(format!("PM10 prediction {}", pm10)),
        ));
    }
    Ok(pm10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::engineer_features;
    use crate::artifacts::{LinearSequenceModel, ScalerArtifact};
    use crate::model::Observation;
    use chrono::NaiveDate;

    fn features(raw_len: usize) -> Vec<FeatureRow> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let observations: Vec<Observation> = (0..raw_len)
            .map(|i| Observation {
                date: start + chrono::Days::new(i as u64),
                pm25: 20.0,
                pm10: 40.0 + i as f64,
                o3: 30.0,
                no2: 25.0,
                so2: 4.0,
            })
            .collect();
        engineer_features(&observations).unwrap()
    }

    fn identity() -> ScalerArtifact {
        ScalerArtifact::Standard {
            mean: vec![0.0; 11],
            scale: vec![1.0; 11],
        }
    }

    fn constant_model(residuals: &[f64]) -> LinearSequenceModel {
        LinearSequenceModel {
            weights: vec![vec![0.0; 330]; residuals.len()],
            intercepts: residuals.to_vec(),
        }
    }

    #[test]
    fn test_zero_residual_reproduces_last_value() {
        for last in [0.0, 1.0, 42.5, 380.0] {
            let value = reconstruct_pm10(last, 0.0);
            assert!((value - last).abs() < 1e-9, "last {}", last);
        }
    }

    #[test]
    fn test_reconstruction_is_log_space() {
        let value = reconstruct_pm10(99.0, 2f64.ln());
        // (99 + 1) * 2 - 1
        assert!((value - 199.0).abs() < 1e-9);
    }

    #[test]
    fn test_predict_pm10_uses_last_row() {
        let model = constant_model(&[0.0]);
        let scaler = identity();
        let adapter = SequenceForecaster::new(&model, &scaler);
        let rows = features(40);
        let pm10 = adapter.predict_pm10(&rows).unwrap();
        assert!((pm10 - 79.0).abs() < 1e-9);
    }

    #[test]
    fn test_multi_output_model_returns_all_residuals() {
        let model = constant_model(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]);
        let scaler = identity();
        let adapter = SequenceForecaster::new(&model, &scaler);
        let residuals = adapter.predict_residuals(&features(40), 7).unwrap();
        assert_eq!(residuals.len(), 7);
        assert_eq!(residuals[6], 0.7);
    }

    #[test]
    fn test_too_few_outputs_is_model_failure() {
        let model = constant_model(&[0.1]);
        let scaler = identity();
        let adapter = SequenceForecaster::new(&model, &scaler);
        assert!(matches!(
            adapter.predict_residuals(&features(40), 7),
            Err(ForecastError::ModelInvocationFailure {
                model: ModelKind::Sequence,
                ..
            })
        ));
    }

    #[test]
    fn test_fewer_than_thirty_rows_is_invalid() {
        let model = constant_model(&[0.0]);
        let scaler = identity();
        let adapter = SequenceForecaster::new(&model, &scaler);
        // 36 raw rows -> 29 feature rows
        assert!(matches!(
            adapter.predict_pm10(&features(36)),
            Err(ForecastError::InvalidWindow(_))
        ));
        // 37 raw rows -> exactly 30
        assert!(adapter.predict_pm10(&features(37)).is_ok());
    }

    #[test]
    fn test_non_finite_feature_is_invalid() {
        let model = constant_model(&[0.0]);
        let scaler = identity();
        let adapter = SequenceForecaster::new(&model, &scaler);
        let mut rows = features(40);
        let last = rows.len() - 1;
        rows[last].no2 = f64::INFINITY;
        assert!(matches!(
            adapter.predict_pm10(&rows),
            Err(ForecastError::InvalidWindow(_))
        ));
    }
}
