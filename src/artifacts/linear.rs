//! Linear regressors stored as JSON coefficient files.

use serde::{Deserialize, Serialize};

use super::{SequenceRegressor, TabularRegressor};
use crate::model::ModelError;

/// `y = intercept + coefficients · x`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl TabularRegressor for LinearRegressor {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.coefficients.len(),
                found: features.len(),
            });
        }
        Ok(dot(&self.coefficients, features) + self.intercept)
    }
}

/// One linear head per forecast day over the flattened window.
///
/// `weights[k]` has `window_len * feature_count` entries, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSequenceModel {
    pub weights: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LinearSequenceModel {
    /// Number of residuals produced per call.
    pub fn outputs(&self) -> usize {
        self.weights.len()
    }
}

impl SequenceRegressor for LinearSequenceModel {
    fn predict(&self, window: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        if self.weights.len() != self.intercepts.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.weights.len(),
                found: self.intercepts.len(),
            });
        }
        let flat: Vec<f64> = window.iter().flatten().copied().collect();
        self.weights
            .iter()
            .zip(&self.intercepts)
            .map(|(head, intercept)| {
                if head.len() != flat.len() {
                    return Err(ModelError::ShapeMismatch {
                        expected: head.len(),
                        found: flat.len(),
                    });
                }
                Ok(dot(head, &flat) + intercept)
            })
            .collect()
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
