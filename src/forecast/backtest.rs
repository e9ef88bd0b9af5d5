//! One-day prediction for a past date.
//!
//! Only observations strictly before the chosen date are visible to the
//! models, so the prediction can be compared with what was actually
//! measured that day.

use chrono::NaiveDate;
use serde::Serialize;

use super::{ForecastModels, SequenceForecaster, TabularForecaster};
use crate::alert::severity::{SeverityCategory, classify_pair};
use crate::analysis::features::engineer_features;
use crate::model::{ForecastError, HistoricalSeries, MIN_FORECAST_HISTORY, Observation};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub date: NaiveDate,
    pub pm25: f64,
    pub pm10: f64,
    pub category: SeverityCategory,
    /// The measured observation for `date`, when the series has one.
    pub actual: Option<Observation>,
    pub actual_category: Option<SeverityCategory>,
}

/// Predicts `date` from the observations that precede it.
///
/// Fails with `InsufficientHistory` when fewer than 40 observations precede
/// the date, before any model is invoked.
pub fn predict_for_date(
    series: &HistoricalSeries,
    date: NaiveDate,
    models: ForecastModels<'_>,
) -> Result<BacktestResult, ForecastError> {
    let prior = series.before(date);
    if prior.len() < MIN_FORECAST_HISTORY {
        return Err(ForecastError::InsufficientHistory {
            required: MIN_FORECAST_HISTORY,
            available: prior.len(),
        });
    }

    let tabular = TabularForecaster::new(
        models.tabular,
        models.tabular_input_scaler,
        models.tabular_output_scaler,
    );
    let sequence = SequenceForecaster::new(models.sequence, models.sequence_scaler);

    let pm25 = tabular.predict_pm25(prior.observations())?;
    let features = engineer_features(prior.observations())?;
    let pm10 = sequence.predict_pm10(&features)?;

    let actual = series.on(date).copied();
    Ok(BacktestResult {
        date,
        pm25,
        pm10,
        category: classify_pair(pm25, pm10).category,
        actual,
        actual_category: actual.map(|o| classify_pair(o.pm25, o.pm10).category),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{LinearRegressor, LinearSequenceModel, ScalerArtifact};
    use chrono::Days;

    fn series(len: usize) -> HistoricalSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let observations = (0..len)
            .map(|i| Observation {
                date: start + Days::new(i as u64),
                pm25: 50.0 + i as f64,
                pm10: 80.0,
                o3: 10.0,
                no2: 30.0,
                so2: 8.0,
            })
            .collect();
        HistoricalSeries::new("S1", observations).unwrap()
    }

    struct Models {
        tabular: LinearRegressor,
        x: ScalerArtifact,
        y: ScalerArtifact,
        sequence: LinearSequenceModel,
        seq_scaler: ScalerArtifact,
    }

    fn models() -> Models {
        let mut coefficients = vec![0.0; 35];
        coefficients[30] = 1.0;
        Models {
            tabular: LinearRegressor {
                coefficients,
                intercept: 0.0,
            },
            x: ScalerArtifact::Standard {
                mean: vec![0.0; 5],
                scale: vec![1.0; 5],
            },
            y: ScalerArtifact::Standard {
                mean: vec![0.0],
                scale: vec![1.0],
            },
            sequence: LinearSequenceModel {
                weights: vec![vec![0.0; 330]],
                intercepts: vec![0.0],
            },
            seq_scaler: ScalerArtifact::Standard {
                mean: vec![0.0; 11],
                scale: vec![1.0; 11],
            },
        }
    }

    impl Models {
        fn handles(&self) -> ForecastModels<'_> {
            ForecastModels {
                tabular: &self.tabular,
                tabular_input_scaler: &self.x,
                tabular_output_scaler: &self.y,
                sequence: &self.sequence,
                sequence_scaler: &self.seq_scaler,
            }
        }
    }

    #[test]
    fn test_uses_only_prior_observations() {
        let s = series(60);
        let m = models();
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + Days::new(45);
        let result = predict_for_date(&s, date, m.handles()).unwrap();
        // The stand-in echoes the previous day's pm25 (index 44).
        assert_eq!(result.pm25, 94.0);
        assert!((result.pm10 - 80.0).abs() < 1e-9);
        assert_eq!(result.category, SeverityCategory::Unhealthy);
        let actual = result.actual.expect("date is inside the series");
        assert_eq!(actual.pm25, 95.0);
        assert_eq!(result.actual_category, Some(SeverityCategory::Unhealthy));
    }

    #[test]
    fn test_date_after_series_has_no_actual() {
        let s = series(50);
        let m = models();
        let date = s.last().unwrap().date + Days::new(1);
        let result = predict_for_date(&s, date, m.handles()).unwrap();
        assert!(result.actual.is_none());
        assert!(result.actual_category.is_none());
    }

    #[test]
    fn test_needs_forty_prior_observations() {
        let s = series(60);
        let m = models();
        let date = s.first().unwrap().date + Days::new(39);
        assert_eq!(
            predict_for_date(&s, date, m.handles()),
            Err(ForecastError::InsufficientHistory {
                required: 40,
                available: 39
            })
        );
    }
}
