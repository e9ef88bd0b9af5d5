/// Derived-data utilities for the air-quality forecast service.
///
/// Submodules:
/// - `features` lag, rolling-mean, cyclical-date and transformed features
///   consumed by the sequence (PM10) model.

pub mod features;
