/// PostgreSQL-backed observation history.
///
/// Expects one row per station and day in a table shaped like:
///
///   station TEXT, date DATE, pm25/pm10/o3/no2/so2 DOUBLE PRECISION
///
/// Rows with a NULL pollutant value are skipped, matching the CSV reader.

use chrono::NaiveDate;
use postgres::types::FromSql;
use postgres::{Client, NoTls, Row};

use super::{HistoryError, HistorySource};
use crate::model::{HistoricalSeries, Observation};

pub struct PgHistorySource {
    client: Client,
    table: String,
}

impl PgHistorySource {
    /// Connects to `url` and reads observations from `table`
    /// (optionally schema-qualified, e.g. `aqi.daily_observations`).
    pub fn connect(url: &str, table: &str) -> Result<Self, HistoryError> {
        validate_table_name(table)?;
        let client = Client::connect(url, NoTls).map_err(|e| HistoryError::Database(e.to_string()))?;
        Ok(Self {
            client,
            table: table.to_string(),
        })
    }

    /// Connects using `DATABASE_URL`, loading `.env` first if present.
    pub fn connect_from_env(table: &str) -> Result<Self, HistoryError> {
        dotenv::dotenv().ok();
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| HistoryError::Database("DATABASE_URL is not set".to_string()))?;
        Self::connect(&url, table)
    }
}

impl HistorySource for PgHistorySource {
    fn station_ids(&mut self) -> Result<Vec<String>, HistoryError> {
        let query = format!("SELECT DISTINCT station FROM {} ORDER BY station", self.table);
        let rows = self
            .client
            .query(query.as_str(), &[])
            .map_err(|e| HistoryError::Database(e.to_string()))?;
        rows.iter().map(|row| column(row, 0)).collect()
    }

    fn load_station(&mut self, station: &str) -> Result<HistoricalSeries, HistoryError> {
        let query = format!(
            "SELECT date, pm25, pm10, o3, no2, so2
             FROM {}
             WHERE station = $1
             ORDER BY date",
            self.table
        );
        let rows = self
            .client
            .query(query.as_str(), &[&station])
            .map_err(|e| HistoryError::Database(e.to_string()))?;

        if rows.is_empty() {
            return Err(HistoryError::UnknownStation(station.to_string()));
        }

        let mut observations = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            let date: Option<NaiveDate> = column(row, 0)?;
            let values: [Option<f64>; 5] = [
                column(row, 1)?,
                column(row, 2)?,
                column(row, 3)?,
                column(row, 4)?,
                column(row, 5)?,
            ];
            if let Some(observation) = observation_from_columns(index, date, values)? {
                observations.push(observation);
            }
        }

        Ok(HistoricalSeries::new(station, observations)?)
    }
}

/// Reads one column, reporting type mismatches instead of panicking.
fn column<T>(row: &Row, index: usize) -> Result<T, HistoryError>
where
    T: for<'a> FromSql<'a>,
{
    row.try_get(index).map_err(|e| {
        HistoryError::Database(format!("column {} of result row: {}", index, e))
    })
}

/// A NULL date is a broken row; a NULL pollutant skips the row.
fn observation_from_columns(
    index: usize,
    date: Option<NaiveDate>,
    values: [Option<f64>; 5],
) -> Result<Option<Observation>, HistoryError> {
    let date = date.ok_or_else(|| HistoryError::Database(format!("row {} has a NULL date", index)))?;
    match values {
        [Some(pm25), Some(pm10), Some(o3), Some(no2), Some(so2)] => Ok(Some(Observation {
            date,
            pm25,
            pm10,
            o3,
            no2,
            so2,
        })),
        _ => Ok(None),
    }
}

/// Table names are interpolated into SQL, so only identifiers are accepted.
fn validate_table_name(table: &str) -> Result<(), HistoryError> {
    let valid = !table.is_empty()
        && table.split('.').count() <= 2
        && table.split('.').all(|part| {
            !part.is_empty()
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !part.starts_with(|c: char| c.is_ascii_digit())
        });
    if valid {
        Ok(())
    } else {
        Err(HistoryError::Database(format!("invalid table name '{}'", table)))
    }
}
