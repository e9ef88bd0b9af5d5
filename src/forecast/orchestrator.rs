//! The 7-day forecast recurrence.
//!
//! Each day is predicted from a private working copy of the history, then
//! appended to it as a synthetic observation so the next day's windows see
//! it. o3/no2/so2 on synthetic days repeat the last known values.
//!
//! Days run strictly in order: day n's PM2.5 window contains day n-1's
//! prediction, so nothing here can run in parallel.

use chrono::Days;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};

use super::sequence::{finite_pm10, last_pm10};
use super::{ForecastModels, ForecastStep, SequenceForecaster, TabularForecaster, reconstruct_pm10};
use crate::alert::severity::classify_pair;
use crate::analysis::features::engineer_features;
use crate::model::{
    ForecastError, HORIZON_DAYS, HistoricalSeries, MIN_FORECAST_HISTORY, Observation,
};

/// How PM10 residuals are obtained from the sequence model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidualMode {
    /// One model call per day on the re-derived features.
    #[default]
    PerStep,
    /// One model call up front returning all seven residuals.
    Batch,
}

pub struct Orchestrator<'a> {
    tabular: TabularForecaster<'a>,
    sequence: SequenceForecaster<'a>,
    mode: ResidualMode,
}

impl<'a> Orchestrator<'a> {
    pub fn new(models: ForecastModels<'a>, mode: ResidualMode) -> Self {
        Self {
            tabular: TabularForecaster::new(
                models.tabular,
                models.tabular_input_scaler,
                models.tabular_output_scaler,
            ),
            sequence: SequenceForecaster::new(models.sequence, models.sequence_scaler),
            mode,
        }
    }

    /// Forecasts the seven days following the last observation.
    pub fn forecast_7_days(
        &self,
        history: &HistoricalSeries,
    ) -> Result<Vec<ForecastStep>, ForecastError> {
        self.forecast_with_cancel(history, &AtomicBool::new(false))
    }

    /// As `forecast_7_days`, checking `cancel` before each day.
    ///
    /// On any error, including cancellation, the working copy is dropped and
    /// no steps are returned.
    pub fn forecast_with_cancel(
        &self,
        history: &HistoricalSeries,
        cancel: &AtomicBool,
    ) -> Result<Vec<ForecastStep>, ForecastError> {
        if history.len() < MIN_FORECAST_HISTORY {
            return Err(ForecastError::InsufficientHistory {
                required: MIN_FORECAST_HISTORY,
                available: history.len(),
            });
        }

        let mut working = history.clone();
        let mut batch: Option<Vec<f64>> = None;
        let mut steps = Vec::with_capacity(HORIZON_DAYS);

        for day in 0..HORIZON_DAYS {
            if cancel.load(Ordering::Relaxed) {
                return Err(ForecastError::Cancelled {
                    completed_days: day,
                });
            }

            let features = engineer_features(working.observations())?;

            let pm10 = match self.mode {
                ResidualMode::PerStep => self.sequence.predict_pm10(&features)?,
                ResidualMode::Batch => {
                    let residuals = match batch.take() {
                        Some(residuals) => residuals,
                        None => self.sequence.predict_residuals(&features, HORIZON_DAYS)?,
                    };
                    let residual = residuals[day];
                    batch = Some(residuals);
                    finite_pm10(reconstruct_pm10(last_pm10(&features)?, residual))?
                }
            };

            let pm25 = self.tabular.predict_pm25(working.observations())?;

            let synthetic = next_observation(&working, pm25, pm10)?;
            working.append(synthetic)?;

            steps.push(ForecastStep {
                date: synthetic.date,
                pm25,
                pm10,
                category: classify_pair(pm25, pm10).category,
            });
        }

        Ok(steps)
    }
}

/// The synthetic observation for the day after the series ends.
fn next_observation(
    series: &HistoricalSeries,
    pm25: f64,
    pm10: f64,
) -> Result<Observation, ForecastError> {
    let last = series
        .last()
        .ok_or_else(|| ForecastError::InvalidWindow("empty series".to_string()))?;
    let date = last
        .date
        .checked_add_days(Days::new(1))
        .ok_or_else(|| ForecastError::InvalidWindow(format!("no day after {}", last.date)))?;
    Ok(Observation {
        date,
        pm25,
        pm10,
        o3: last.o3,
        no2: last.no2,
        so2: last.so2,
    })
}
