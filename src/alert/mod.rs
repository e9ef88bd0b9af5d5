//! Severity classification for forecast and observed pollutant levels.

pub mod severity;
