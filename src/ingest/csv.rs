/// Processed-dataset CSV reader.
///
/// The dataset holds one row per station and day:
///
///   date,station,pm25,pm10,o3,no2,so2[,...]
///
/// Columns are located by header name, so extra columns and reordering are
/// tolerated. Quoted fields and a leading byte order mark are accepted, as
/// written by pandas and spreadsheet exports. Rows with a missing (`null`/empty) pollutant value are
/// skipped and counted rather than failing the whole file; other parse
/// errors are reported with their line number.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::BTreeMap;
use std::path::Path;

use super::{HistoryError, HistorySource};
use crate::model::{HistoricalSeries, Observation};

const REQUIRED_COLUMNS: [&str; 7] = ["date", "station", "pm25", "pm10", "o3", "no2", "so2"];

#[derive(Debug, Default)]
pub struct CsvHistorySource {
    stations: BTreeMap<String, Vec<Observation>>,
    skipped_rows: usize,
}

impl CsvHistorySource {
    /// Reads and parses the dataset at `path`.
    pub fn from_path(path: &Path) -> Result<Self, HistoryError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| HistoryError::Io(format!("{}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    /// Parses dataset text; observations are grouped by station and sorted
    /// by date.
    pub fn parse(text: &str) -> Result<Self, HistoryError> {
        // Spreadsheet exports often start with a UTF-8 byte order mark.
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        if text.trim().is_empty() {
            return Err(HistoryError::Parse {
                line: 1,
                message: "empty dataset".to_string(),
            });
        }
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let header = reader.headers().map_err(parse_error)?.clone();
        let columns = locate_columns(&header)?;

        let mut source = CsvHistorySource::default();
        for record in reader.records() {
            let record = record.map_err(parse_error)?;
            let line_no = record.position().map_or(0, |p| p.line() as usize);
            match parse_row(&record, &columns, line_no)? {
                Some((station, observation)) => {
                    source.stations.entry(station).or_default().push(observation)
                }
                None => source.skipped_rows += 1,
            }
        }

        for observations in source.stations.values_mut() {
            observations.sort_by_key(|o| o.date);
        }
        Ok(source)
    }

    /// Rows dropped because a pollutant value was missing.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

impl HistorySource for CsvHistorySource {
    fn station_ids(&mut self) -> Result<Vec<String>, HistoryError> {
        Ok(self.stations.keys().cloned().collect())
    }

    fn load_station(&mut self, station: &str) -> Result<HistoricalSeries, HistoryError> {
        let observations = self
            .stations
            .get(station)
            .ok_or_else(|| HistoryError::UnknownStation(station.to_string()))?;
        Ok(HistoricalSeries::new(station, observations.clone())?)
    }
}

fn parse_error(err: csv::Error) -> HistoryError {
    HistoryError::Parse {
        line: err.position().map_or(0, |p| p.line() as usize),
        message: err.to_string(),
    }
}

/// Indices of the required columns, in `REQUIRED_COLUMNS` order.
fn locate_columns(header: &StringRecord) -> Result<[usize; 7], HistoryError> {
    let mut indices = [0usize; 7];
    for (slot, required) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = header
            .iter()
            .position(|n| n.eq_ignore_ascii_case(required))
            .ok_or_else(|| HistoryError::Parse {
                line: 1,
                message: format!("missing column '{}'", required),
            })?;
    }
    Ok(indices)
}

/// Parses one data row. `Ok(None)` means a pollutant value was missing.
fn parse_row(
    record: &StringRecord,
    columns: &[usize; 7],
    line: usize,
) -> Result<Option<(String, Observation)>, HistoryError> {
    let field = |i: usize| {
        record
            .get(columns[i])
            .ok_or_else(|| HistoryError::Parse {
                line,
                message: format!("row has no '{}' field", REQUIRED_COLUMNS[i]),
            })
    };

    // Dates may carry a time part ("2024-01-05 00:00:00"); only the day matters.
    let raw_date = field(0)?;
    let date = raw_date
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .ok_or_else(|| HistoryError::Parse {
            line,
            message: format!("invalid date '{}'", raw_date),
        })?;

    let station = field(1)?.to_string();
    if station.is_empty() {
        return Err(HistoryError::Parse {
            line,
            message: "empty station".to_string(),
        });
    }

    let mut values = [0.0f64; 5];
    for (k, value) in values.iter_mut().enumerate() {
        let raw = field(k + 2)?;
        if raw.is_empty() || raw.eq_ignore_ascii_case("null") || raw.eq_ignore_ascii_case("nan") {
            return Ok(None);
        }
        *value = raw.parse().map_err(|_| HistoryError::Parse {
            line,
            message: format!("invalid {} value '{}'", REQUIRED_COLUMNS[k + 2], raw),
        })?;
    }

    Ok(Some((
        station,
        Observation {
            date,
            pm25: values[0],
            pm10: values[1],
            o3: values[2],
            no2: values[3],
            so2: values[4],
        },
    )))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
