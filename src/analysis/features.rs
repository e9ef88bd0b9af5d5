//! Feature engineering for the sequence (PM10) model.
//!
//! Lags and rolling windows are positional: row `i` looks back at rows
//! `i-1` and `i-7`, and averages `pm25` over rows `i-6..=i`. On a gap-free
//! daily series this is the same as calendar lag. Nothing here looks past a
//! row's own position, so re-running on an extended series never changes
//! the rows already derived.

use chrono::Datelike;
use std::f64::consts::PI;

use crate::model::{FEATURE_WARMUP, FeatureRow, ForecastError, Observation};

/// Length of the cyclical day-of-year period.
const YEAR_PERIOD_DAYS: f64 = 365.25;

/// Derives one `FeatureRow` per observation that has seven predecessors.
///
/// The first `FEATURE_WARMUP` observations cannot back a lag-7 value and are
/// dropped, so the output is always `observations.len() - 7` rows long.
///
/// Fails with `InsufficientHistory` when the input has 7 or fewer rows.
pub fn engineer_features(observations: &[Observation]) -> Result<Vec<FeatureRow>, ForecastError> {
    if observations.len() <= FEATURE_WARMUP {
        return Err(ForecastError::InsufficientHistory {
            required: FEATURE_WARMUP + 1,
            available: observations.len(),
        });
    }

    let rows = (FEATURE_WARMUP..observations.len())
        .map(|i| {
            let current = &observations[i];
            let trailing = &observations[i + 1 - FEATURE_WARMUP..=i];
            let roll_mean =
                trailing.iter().map(|o| o.pm25).sum::<f64>() / FEATURE_WARMUP as f64;
            let (doy_sin, doy_cos) = day_of_year_cycle(current);

            FeatureRow {
                date: current.date,
                pm25: current.pm25,
                o3: current.o3,
                no2: current.no2,
                so2: current.so2,
                pm10: current.pm10,
                pm25_lag1: observations[i - 1].pm25,
                pm25_lag7: observations[i - FEATURE_WARMUP].pm25,
                pm25_roll7_mean: roll_mean,
                doy_sin,
                doy_cos,
                o3_inverse: 1.0 / (current.o3 + 1.0),
            }
        })
        .collect();

    Ok(rows)
}

/// Sine/cosine encoding of the 1-based day of year.
fn day_of_year_cycle(observation: &Observation) -> (f64, f64) {
    let angle = 2.0 * PI * observation.date.ordinal() as f64 / YEAR_PERIOD_DAYS;
    (angle.sin(), angle.cos())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(len: usize) -> Vec<Observation> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..len)
            .map(|i| Observation {
                date: start + chrono::Days::new(i as u64),
                pm25: i as f64,
                pm10: 10.0 + i as f64,
                o3: 4.0,
                no2: 20.0,
                so2: 3.0,
            })
            .collect()
    }

    #[test]
    fn test_drops_exactly_the_first_seven_rows() {
        for len in [8, 9, 40, 100] {
            let input = series(len);
            let rows = engineer_features(&input).expect("enough rows");
            assert_eq!(rows.len(), len - 7, "input of {} rows", len);
            assert_eq!(rows[0].date, input[7].date);
            assert_eq!(rows.last().unwrap().date, input[len - 1].date);
        }
    }

    #[test]
    fn test_seven_rows_is_insufficient() {
        let result = engineer_features(&series(7));
        assert_eq!(
            result,
            Err(ForecastError::InsufficientHistory {
                required: 8,
                available: 7
            })
        );
    }

    #[test]
    fn test_empty_input_is_insufficient() {
        assert!(matches!(
            engineer_features(&[]),
            Err(ForecastError::InsufficientHistory { available: 0, .. })
        ));
    }

    #[test]
    fn test_lag_and_rolling_values() {
        // pm25 equals the row index, so lags and means are easy to read off.
        let rows = engineer_features(&series(12)).unwrap();
        let row = &rows[3]; // observation index 10
        assert_eq!(row.pm25, 10.0);
        assert_eq!(row.pm25_lag1, 9.0);
        assert_eq!(row.pm25_lag7, 3.0);
        // mean of 4..=10
        assert!((row.pm25_roll7_mean - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_o3_inverse_and_day_of_year() {
        let rows = engineer_features(&series(8)).unwrap();
        let row = &rows[0]; // 2024-01-08, day-of-year 8
        assert!((row.o3_inverse - 0.2).abs() < 1e-12);
        let angle = 2.0 * PI * 8.0 / 365.25;
        assert!((row.doy_sin - angle.sin()).abs() < 1e-12);
        assert!((row.doy_cos - angle.cos()).abs() < 1e-12);
    }

    #[test]
    fn test_no_missing_values_in_output() {
        let rows = engineer_features(&series(50)).unwrap();
        for row in rows {
            assert!(row.to_vector().iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_extending_input_does_not_change_existing_rows() {
        let input = series(40);
        let before = engineer_features(&input[..39]).unwrap();
        let after = engineer_features(&input).unwrap();
        assert_eq!(&after[..before.len()], &before[..]);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let input = series(20);
        let copy = input.clone();
        let _ = engineer_features(&input).unwrap();
        assert_eq!(input, copy);
    }
}
