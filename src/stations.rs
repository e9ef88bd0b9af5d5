/// Station registry and per-station history summaries.
///
/// The registry comes from the `[[stations]]` entries of the service
/// configuration; the history source is the authority on which stations
/// actually have data. Configured metadata only adds a display name and a
/// description.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{HistoricalSeries, Observation};

/// Number of recent observations included in a summary.
pub const RECENT_DAYS: usize = 7;

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// Metadata for a single monitoring station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Identifier used in the dataset and in artifact file names.
    pub id: String,
    /// Human-readable station name.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Station {
    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.id } else { &self.name }
    }
}

/// Looks up a station by id. Returns `None` if not configured.
pub fn find_station<'a>(stations: &'a [Station], id: &str) -> Option<&'a Station> {
    stations.iter().find(|s| s.id == id)
}

// ---------------------------------------------------------------------------
// History summary
// ---------------------------------------------------------------------------

/// Overview of one station's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummary {
    pub station: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub total_records: usize,
    /// Up to `RECENT_DAYS` most recent observations, oldest first.
    pub recent: Vec<Observation>,
}

/// Summarizes a series. Returns `None` for an empty series.
pub fn summarize(series: &HistoricalSeries) -> Option<StationSummary> {
    let first = series.first()?;
    let last = series.last()?;
    let observations = series.observations();
    let recent_start = observations.len().saturating_sub(RECENT_DAYS);
    Some(StationSummary {
        station: series.station().to_string(),
        first_date: first.date,
        last_date: last.date,
        total_records: series.len(),
        recent: observations[recent_start..].to_vec(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
