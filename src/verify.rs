//! Station Verification Module
//!
//! Checks every station the history source knows about: does it have enough
//! history to forecast, and do its model artifacts load? Run this after
//! deploying new artifacts or pointing the service at a new dataset.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::logging::{self, Component};
use crate::model::MIN_FORECAST_HISTORY;
use crate::service::{ForecastService, ServiceError};

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub stations: Vec<StationVerification>,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub working: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationVerification {
    pub station: String,
    pub name: String,
    pub status: VerificationStatus,
    pub history_records: usize,
    pub history_sufficient: bool,
    pub artifacts_loaded: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    /// History is long enough and every artifact loads.
    Success,
    /// Artifacts load but history is too short to forecast yet.
    PartialSuccess,
    Failed,
}

// ============================================================================
// Per-station checks
// ============================================================================

pub fn verify_station(service: &mut ForecastService, station: &str) -> StationVerification {
    let mut result = StationVerification {
        station: station.to_string(),
        name: service.station_name(station),
        status: VerificationStatus::Failed,
        history_records: 0,
        history_sufficient: false,
        artifacts_loaded: false,
        error_message: None,
    };

    match service.load_history(station) {
        Ok(series) => {
            result.history_records = series.len();
            result.history_sufficient = series.len() >= MIN_FORECAST_HISTORY;
        }
        Err(e) => {
            result.error_message = Some(format!("History: {}", e));
            return result;
        }
    }

    match service.load_artifacts(station) {
        Ok(_) => result.artifacts_loaded = true,
        Err(e) => {
            result.error_message = Some(format!("Artifacts: {}", e));
            return result;
        }
    }

    if result.history_sufficient {
        result.status = VerificationStatus::Success;
    } else {
        result.status = VerificationStatus::PartialSuccess;
        result.error_message = Some(format!(
            "only {} observations, {} needed to forecast",
            result.history_records, MIN_FORECAST_HISTORY
        ));
    }
    result
}

// ============================================================================
// Full run
// ============================================================================

pub fn verify_all(service: &mut ForecastService) -> Result<VerificationReport, ServiceError> {
    let mut report = VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        stations: Vec::new(),
        summary: VerificationSummary::default(),
    };

    let stations = service.stations()?;
    report.summary.total = stations.len();

    for station in &stations {
        let result = verify_station(service, station);
        match result.status {
            VerificationStatus::Success | VerificationStatus::PartialSuccess => {
                report.summary.working += 1
            }
            VerificationStatus::Failed => report.summary.failed += 1,
        }
        report.stations.push(result);
    }

    logging::log_run_summary(
        Component::System,
        report.summary.total,
        report.summary.working,
        report.summary.failed,
    );
    Ok(report)
}

pub fn print_summary(report: &VerificationReport) {
    println!("═══════════════════════════════════════════════════════════");
    println!("STATION VERIFICATION ({})", report.timestamp);
    println!("═══════════════════════════════════════════════════════════");
    for station in &report.stations {
        let marker = match station.status {
            VerificationStatus::Success => "✓",
            VerificationStatus::PartialSuccess => "⚠",
            VerificationStatus::Failed => "✗",
        };
        print!(
            "  {} {:<24} {:>6} records",
            marker, station.name, station.history_records
        );
        match &station.error_message {
            Some(msg) => println!("  {}", msg),
            None => println!(),
        }
    }
    println!();
    println!(
        "Stations: {}/{} working  ({} failed)",
        report.summary.working, report.summary.total, report.summary.failed
    );
    println!("═══════════════════════════════════════════════════════════");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::ingest::csv::CsvHistorySource;

    fn service_with_rows(rows: usize) -> ForecastService {
        let mut csv = String::from("date,station,pm25,pm10,o3,no2,so2\n");
        let start = chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        for i in 0..rows {
            let date = start + chrono::Days::new(i as u64);
            csv.push_str(&format!("{},Short,10,20,30,40,5\n", date));
        }
        let mut config = ServiceConfig::default();
        config.artifacts.dir = std::env::temp_dir().join("airq_verify_no_artifacts_here");
        ForecastService::with_source(config, Box::new(CsvHistorySource::parse(&csv).unwrap()))
    }

    #[test]
    fn test_missing_artifacts_fail_verification() {
        let mut service = service_with_rows(50);
        let result = verify_station(&mut service, "Short");
        assert_eq!(result.status, VerificationStatus::Failed);
        assert_eq!(result.history_records, 50);
        assert!(result.history_sufficient);
        assert!(!result.artifacts_loaded);
        assert!(result.error_message.unwrap().starts_with("Artifacts:"));
    }

    #[test]
    fn test_unknown_station_fails_on_history() {
        let mut service = service_with_rows(5);
        let result = verify_station(&mut service, "Elsewhere");
        assert_eq!(result.status, VerificationStatus::Failed);
        assert!(result.error_message.unwrap().starts_with("History:"));
    }

    #[test]
    fn test_verify_all_counts_every_station() {
        let mut service = service_with_rows(10);
        let report = verify_all(&mut service).unwrap();
        assert_eq!(report.summary.total, 1);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.stations[0].station, "Short");
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"history_records\":10"));
    }
}
