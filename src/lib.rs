//! Seven-day PM2.5 / PM10 forecasting for air-quality monitoring stations.
//!
//! The engine (`analysis`, `forecast`, `alert`) is pure computation over a
//! station's daily history and a set of fitted models. Everything around it
//! (history sources, artifact files, configuration, logging) lives in the
//! remaining modules and is wired together by `service`.

pub mod alert;
pub mod analysis;
pub mod artifacts;
pub mod config;
pub mod forecast;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod service;
pub mod stations;
pub mod verify;
