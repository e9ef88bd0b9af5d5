//! Service layer: configuration, history source, artifacts and logging
//! around the forecast engine.
//!
//! Artifacts are loaded per request and dropped afterwards; nothing is
//! cached between stations or calls.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::alert::severity::SeverityCategory;
use crate::artifacts::{ArtifactError, StationArtifacts};
use crate::config::{ConfigError, HistoryBackend, ServiceConfig};
use crate::forecast::{
    BacktestResult, ForecastModels, ForecastStep, Orchestrator, predict_for_date, round_to,
};
use crate::ingest::csv::CsvHistorySource;
use crate::ingest::postgres::PgHistorySource;
use crate::ingest::{HistoryError, HistorySource};
use crate::logging::{self, Component};
use crate::model::{ForecastError, HistoricalSeries};
use crate::stations::{self, StationSummary};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ServiceError {
    Config(ConfigError),
    History(HistoryError),
    Artifacts(ArtifactError),
    Forecast(ForecastError),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Config(e) => write!(f, "{}", e),
            ServiceError::History(e) => write!(f, "{}", e),
            ServiceError::Artifacts(e) => write!(f, "{}", e),
            ServiceError::Forecast(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<ConfigError> for ServiceError {
    fn from(err: ConfigError) -> Self {
        ServiceError::Config(err)
    }
}

impl From<HistoryError> for ServiceError {
    fn from(err: HistoryError) -> Self {
        ServiceError::History(err)
    }
}

impl From<ArtifactError> for ServiceError {
    fn from(err: ArtifactError) -> Self {
        ServiceError::Artifacts(err)
    }
}

impl From<ForecastError> for ServiceError {
    fn from(err: ForecastError) -> Self {
        ServiceError::Forecast(err)
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// One forecast day, rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub day_name: String,
    pub day_short: String,
    pub pm25: f64,
    pub pm10: f64,
    pub category: &'static str,
    pub severity_key: &'static str,
    pub color: &'static str,
}

impl DayReport {
    pub fn from_step(step: &ForecastStep, precision: u32) -> Self {
        Self {
            date: step.date,
            day_name: step.day_name(),
            day_short: step.day_short(),
            pm25: step.rounded_pm25(precision),
            pm10: step.rounded_pm10(precision),
            category: step.category_name(),
            severity_key: step.severity_key(),
            color: step.category.hex_color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    pub station: String,
    pub station_name: String,
    pub last_observed: NaiveDate,
    pub days: Vec<DayReport>,
}

impl fmt::Display for ForecastReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "7-day forecast for {} (last observation {})",
            self.station_name,
            self.last_observed.format("%d.%m.%Y")
        )?;
        for (i, day) in self.days.iter().enumerate() {
            let label = if i == 0 {
                "Tomorrow".to_string()
            } else {
                format!("Day {}", i + 1)
            };
            writeln!(
                f,
                "  {:<9} {} {}  PM2.5 {:>7.2}  PM10 {:>7.2}  {}",
                label,
                day.day_short,
                day.date.format("%d.%m."),
                day.pm25,
                day.pm10,
                day.category
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub station: String,
    pub date: NaiveDate,
    pub pm25: f64,
    pub pm10: f64,
    pub category: &'static str,
    pub severity_key: &'static str,
    pub color: &'static str,
    pub actual_pm25: Option<f64>,
    pub actual_pm10: Option<f64>,
    pub actual_category: Option<&'static str>,
}

impl BacktestReport {
    pub fn from_result(station: &str, result: &BacktestResult, precision: u32) -> Self {
        Self {
            station: station.to_string(),
            date: result.date,
            pm25: round_to(result.pm25, precision),
            pm10: round_to(result.pm10, precision),
            category: result.category.name(),
            severity_key: result.category.key(),
            color: result.category.hex_color(),
            actual_pm25: result.actual.map(|o| round_to(o.pm25, precision)),
            actual_pm10: result.actual.map(|o| round_to(o.pm10, precision)),
            actual_category: result.actual_category.map(SeverityCategory::name),
        }
    }
}

impl fmt::Display for BacktestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} on {}: {}",
            self.station,
            self.date.format("%d.%m.%Y"),
            self.category
        )?;
        writeln!(f, "  predicted  PM2.5 {:.2}  PM10 {:.2}", self.pm25, self.pm10)?;
        match (self.actual_pm25, self.actual_pm10, self.actual_category) {
            (Some(pm25), Some(pm10), Some(category)) => writeln!(
                f,
                "  observed   PM2.5 {:.2}  PM10 {:.2}  {}",
                pm25, pm10, category
            ),
            _ => writeln!(f, "  observed   (no measurement for this date)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct ForecastService {
    config: ServiceConfig,
    history: Box<dyn HistorySource>,
}

impl ForecastService {
    /// Opens the configured history source.
    pub fn from_config(config: ServiceConfig) -> Result<Self, ServiceError> {
        let history: Box<dyn HistorySource> = match config.history.source {
            HistoryBackend::Csv => {
                let source = CsvHistorySource::from_path(&config.history.csv_path)
                    .inspect_err(|e| logging::log_history_failure("-", "open dataset", e))?;
                if source.skipped_rows() > 0 {
                    logging::warn(
                        Component::History,
                        None,
                        &format!(
                            "skipped {} dataset rows with missing values",
                            source.skipped_rows()
                        ),
                    );
                }
                Box::new(source)
            }
            HistoryBackend::Postgres => Box::new(
                PgHistorySource::connect_from_env(&config.history.table)
                    .inspect_err(|e| logging::log_history_failure("-", "connect", e))?,
            ),
        };
        Ok(Self::with_source(config, history))
    }

    /// Uses an already-open history source.
    pub fn with_source(config: ServiceConfig, history: Box<dyn HistorySource>) -> Self {
        Self { config, history }
    }

    /// Station ids that have data in the history source.
    pub fn stations(&mut self) -> Result<Vec<String>, ServiceError> {
        Ok(self.history.station_ids()?)
    }

    /// Display name from the registry, or the id itself.
    pub fn station_name(&self, station: &str) -> String {
        stations::find_station(&self.config.stations, station)
            .map(|s| s.display_name().to_string())
            .unwrap_or_else(|| station.to_string())
    }

    pub fn load_history(&mut self, station: &str) -> Result<HistoricalSeries, ServiceError> {
        let series = self
            .history
            .load_station(station)
            .inspect_err(|e| logging::log_history_failure(station, "load history", e))?;
        logging::debug(
            Component::History,
            Some(station),
            &format!("loaded {} observations", series.len()),
        );
        Ok(series)
    }

    pub fn summary(&mut self, station: &str) -> Result<StationSummary, ServiceError> {
        let series = self.load_history(station)?;
        stations::summarize(&series)
            .ok_or_else(|| ServiceError::History(HistoryError::UnknownStation(station.to_string())))
    }

    pub fn load_artifacts(&self, station: &str) -> Result<StationArtifacts, ServiceError> {
        let settings = &self.config.artifacts;
        let artifacts = StationArtifacts::load(
            &settings.dir,
            station,
            settings.sequence_endpoint.as_deref(),
            settings.timeout(),
        )
        .inspect_err(|e| {
            logging::error(
                Component::Artifacts,
                Some(station),
                &format!("artifact load failed: {}", e),
            )
        })?;
        logging::info(
            Component::Artifacts,
            Some(station),
            &format!("models loaded for {}", station),
        );
        Ok(artifacts)
    }

    /// Loads history and artifacts, then runs the 7-day forecast.
    pub fn forecast(&mut self, station: &str) -> Result<ForecastReport, ServiceError> {
        let series = self.load_history(station)?;
        let artifacts = self.load_artifacts(station)?;
        self.forecast_series(&series, artifacts.models())
    }

    /// Runs the 7-day forecast on a loaded series with caller-supplied models.
    pub fn forecast_series(
        &self,
        series: &HistoricalSeries,
        models: ForecastModels<'_>,
    ) -> Result<ForecastReport, ServiceError> {
        let station = series.station();
        let last_observed = series
            .last()
            .map(|o| o.date)
            .ok_or(ForecastError::InsufficientHistory {
                required: crate::model::MIN_FORECAST_HISTORY,
                available: 0,
            })?;

        let orchestrator = Orchestrator::new(models, self.config.forecast.residual_mode);
        let steps = orchestrator
            .forecast_7_days(series)
            .inspect_err(|e| {
                logging::log_forecast_failure(Component::Forecast, station, "7-day forecast", e)
            })?;

        let precision = self.config.forecast.display_precision;
        let report = ForecastReport {
            station: station.to_string(),
            station_name: self.station_name(station),
            last_observed,
            days: steps
                .iter()
                .map(|s| DayReport::from_step(s, precision))
                .collect(),
        };
        let worst = steps.iter().map(|s| s.category).max();
        logging::info(
            Component::Forecast,
            Some(station),
            &format!(
                "forecast generated: {} days, worst category {}",
                report.days.len(),
                worst.map(SeverityCategory::name).unwrap_or("-")
            ),
        );
        Ok(report)
    }

    /// Predicts a past date from the observations before it.
    pub fn backtest(&mut self, station: &str, date: NaiveDate) -> Result<BacktestReport, ServiceError> {
        let series = self.load_history(station)?;
        let artifacts = self.load_artifacts(station)?;
        self.backtest_series(&series, date, artifacts.models())
    }

    /// Backtests a loaded series with caller-supplied models.
    pub fn backtest_series(
        &self,
        series: &HistoricalSeries,
        date: NaiveDate,
        models: ForecastModels<'_>,
    ) -> Result<BacktestReport, ServiceError> {
        let station = series.station();
        let result = predict_for_date(series, date, models).inspect_err(|e| {
            logging::log_forecast_failure(Component::Backtest, station, "backtest", e)
        })?;
        logging::info(
            Component::Backtest,
            Some(station),
            &format!("backtest for {}: {}", date, result.category.name()),
        );
        Ok(BacktestReport::from_result(
            station,
            &result,
            self.config.forecast.display_precision,
        ))
    }
}
