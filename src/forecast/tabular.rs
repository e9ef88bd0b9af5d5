//! PM2.5 adapter around the pretrained tabular regressor.

use crate::artifacts::{Scaler, TabularRegressor};
use crate::model::{ForecastError, ModelError, ModelKind, Observation, RAW_COLUMNS, TABULAR_WINDOW};

pub struct TabularForecaster<'a> {
    model: &'a dyn TabularRegressor,
    input_scaler: &'a dyn Scaler,
    output_scaler: &'a dyn Scaler,
}

impl<'a> TabularForecaster<'a> {
    pub fn new(
        model: &'a dyn TabularRegressor,
        input_scaler: &'a dyn Scaler,
        output_scaler: &'a dyn Scaler,
    ) -> Self {
        Self {
            model,
            input_scaler,
            output_scaler,
        }
    }

    /// Predicts the next day's PM2.5 from the trailing 7 observations.
    ///
    /// The 7×5 window is scaled column-wise, flattened row by row into 35
    /// inputs, and the scalar output is mapped back through the output
    /// scaler. The result is not clamped.
    pub fn predict_pm25(&self, observations: &[Observation]) -> Result<f64, ForecastError> {
        if observations.len() < TABULAR_WINDOW {
            return Err(ForecastError::InvalidWindow(format!(
                "tabular window needs {} rows, {} available",
                TABULAR_WINDOW,
                observations.len()
            )));
        }
        let window = &observations[observations.len() - TABULAR_WINDOW..];
        if let Some(bad) = window.iter().find(|o| !o.is_complete()) {
            return Err(ForecastError::InvalidWindow(format!(
                "observation on {} has a missing or non-finite value",
                bad.date
            )));
        }

        let rows: Vec<Vec<f64>> = window.iter().map(|o| o.numeric_columns().to_vec()).collect();
        let scaled = self
            .input_scaler
            .transform(&rows)
            .map_err(|e| ForecastError::model(ModelKind::Tabular, e))?;
        let flat: Vec<f64> = scaled.into_iter().flatten().collect();
        let expected = TABULAR_WINDOW * RAW_COLUMNS.len();
        if flat.len() != expected {
            return Err(ForecastError::model(
                ModelKind::Tabular,
                ModelError::ShapeMismatch {
                    expected,
                    found: flat.len(),
                },
            ));
        }

        let scaled_output = self
            .model
            .predict(&flat)
            .map_err(|e| ForecastError::model(ModelKind::Tabular, e))?;
        let pm25 = self
            .output_scaler
            .inverse_transform(&[scaled_output])
            .map_err(|e| ForecastError::model(ModelKind::Tabular, e))?
            .first()
            .copied()
            .ok_or_else(|| {
                ForecastError::model(
                    ModelKind::Tabular,
                    ModelError::ShapeMismatch {
                        expected: 1,
                        found: 0,
                    },
                )
            })?;

        if !pm25.is_finite() {
            return Err(ForecastError::model(
                ModelKind::Tabular,
                ModelError::NonFinite(format!("PM2.5 prediction {}", pm25)),
            ));
        }
        Ok(pm25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{LinearRegressor, ScalerArtifact};
    use chrono::NaiveDate;

    fn window(len: usize) -> Vec<Observation> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        (0..len)
            .map(|i| Observation {
                date: start + chrono::Days::new(i as u64),
                pm25: 10.0 + i as f64,
                pm10: 30.0,
                o3: 40.0,
                no2: 20.0,
                so2: 2.0,
            })
            .collect()
    }

    fn identity(columns: usize) -> ScalerArtifact {
        ScalerArtifact::Standard {
            mean: vec![0.0; columns],
            scale: vec![1.0; columns],
        }
    }

    /// Model that returns the pm25 of the last row in the flattened window.
    fn last_pm25_model() -> LinearRegressor {
        let mut coefficients = vec![0.0; 35];
        coefficients[30] = 1.0;
        LinearRegressor {
            coefficients,
            intercept: 0.0,
        }
    }

    #[test]
    fn test_uses_trailing_seven_rows_in_column_order() {
        let model = last_pm25_model();
        let (x, y) = (identity(5), identity(1));
        let adapter = TabularForecaster::new(&model, &x, &y);
        let pm25 = adapter.predict_pm25(&window(12)).unwrap();
        assert_eq!(pm25, 21.0);
    }

    #[test]
    fn test_output_scaler_denormalizes() {
        let model = LinearRegressor {
            coefficients: vec![0.0; 35],
            intercept: 1.5,
        };
        let x = identity(5);
        let y = ScalerArtifact::Standard {
            mean: vec![20.0],
            scale: vec![4.0],
        };
        let adapter = TabularForecaster::new(&model, &x, &y);
        assert_eq!(adapter.predict_pm25(&window(7)).unwrap(), 26.0);
    }

    #[test]
    fn test_negative_outputs_are_not_clamped() {
        let model = LinearRegressor {
            coefficients: vec![0.0; 35],
            intercept: -3.0,
        };
        let (x, y) = (identity(5), identity(1));
        let adapter = TabularForecaster::new(&model, &x, &y);
        assert_eq!(adapter.predict_pm25(&window(7)).unwrap(), -3.0);
    }

    #[test]
    fn test_short_window_is_invalid() {
        let model = last_pm25_model();
        let (x, y) = (identity(5), identity(1));
        let adapter = TabularForecaster::new(&model, &x, &y);
        assert!(matches!(
            adapter.predict_pm25(&window(6)),
            Err(ForecastError::InvalidWindow(_))
        ));
    }

    #[test]
    fn test_missing_value_in_window_is_invalid() {
        let model = last_pm25_model();
        let (x, y) = (identity(5), identity(1));
        let adapter = TabularForecaster::new(&model, &x, &y);
        let mut rows = window(10);
        rows[8].so2 = f64::NAN;
        assert!(matches!(
            adapter.predict_pm25(&rows),
            Err(ForecastError::InvalidWindow(_))
        ));
        // A bad value outside the trailing window is irrelevant.
        let mut rows = window(10);
        rows[0].so2 = f64::NAN;
        assert!(adapter.predict_pm25(&rows).is_ok());
    }

    #[test]
    fn test_scaler_mismatch_is_model_failure() {
        let model = last_pm25_model();
        let (x, y) = (identity(4), identity(1));
        let adapter = TabularForecaster::new(&model, &x, &y);
        assert!(matches!(
            adapter.predict_pm25(&window(7)),
            Err(ForecastError::ModelInvocationFailure {
                model: ModelKind::Tabular,
                ..
            })
        ));
    }
}
