/// Forecast generation engine.
///
/// Two adapters wrap the pretrained models (tabular → PM2.5, sequence
/// residual → PM10); the orchestrator chains them over seven days, feeding
/// every predicted day back into a private copy of the history.
///
/// Submodules:
/// - `tabular`      PM2.5 from the trailing 7 raw observations
/// - `sequence`     PM10 from the trailing 30 engineered rows
/// - `orchestrator` the 7-day recurrence
/// - `backtest`     one-day prediction for a past date

pub mod backtest;
pub mod orchestrator;
pub mod sequence;
pub mod tabular;

pub use backtest::{BacktestResult, predict_for_date};
pub use orchestrator::{Orchestrator, ResidualMode};
pub use sequence::{SequenceForecaster, reconstruct_pm10};
pub use tabular::TabularForecaster;

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::alert::severity::SeverityCategory;
use crate::artifacts::{Scaler, SequenceRegressor, TabularRegressor};

/// Already-loaded model handles for one station.
#[derive(Clone, Copy)]
pub struct ForecastModels<'a> {
    pub tabular: &'a dyn TabularRegressor,
    pub tabular_input_scaler: &'a dyn Scaler,
    pub tabular_output_scaler: &'a dyn Scaler,
    pub sequence: &'a dyn SequenceRegressor,
    pub sequence_scaler: &'a dyn Scaler,
}

/// One forecast day.
///
/// `pm25`/`pm10` keep full precision; use `rounded_*` for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastStep {
    pub date: NaiveDate,
    pub pm25: f64,
    pub pm10: f64,
    pub category: SeverityCategory,
}

impl ForecastStep {
    pub fn category_name(&self) -> &'static str {
        self.category.name()
    }

    pub fn severity_key(&self) -> &'static str {
        self.category.key()
    }

    /// Full weekday name, e.g. "Monday".
    pub fn day_name(&self) -> String {
        self.date.format("%A").to_string()
    }

    /// Abbreviated weekday name, e.g. "Mon".
    pub fn day_short(&self) -> String {
        self.date.format("%a").to_string()
    }

    pub fn rounded_pm25(&self, decimals: u32) -> f64 {
        round_to(self.pm25, decimals)
    }

    pub fn rounded_pm10(&self, decimals: u32) -> f64 {
        round_to(self.pm10, decimals)
    }
}

// Serialized with both the display name and the severity key.
impl Serialize for ForecastStep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut step = serializer.serialize_struct("ForecastStep", 5)?;
        step.serialize_field("date", &self.date)?;
        step.serialize_field("pm25", &self.pm25)?;
        step.serialize_field("pm10", &self.pm10)?;
        step.serialize_field("category", self.category_name())?;
        step.serialize_field("severity_key", self.severity_key())?;
        step.end()
    }
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
