//! Fitted column scalers.
//!
//! Both variants follow the usual fitted-scaler conventions:
//!   standard: `(x - mean) / scale`
//!   min_max:  `x * scale + min`
//! and are stored as JSON tagged by `kind`.

use serde::{Deserialize, Serialize};

use super::{Matrix, Scaler};
use crate::model::ModelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl ScalerArtifact {
    /// Number of columns the scaler was fitted on.
    pub fn columns(&self) -> usize {
        match self {
            ScalerArtifact::Standard { mean, .. } => mean.len(),
            ScalerArtifact::MinMax { min, .. } => min.len(),
        }
    }

    /// Checks the parameter vectors agree in length and `scale` has no zeros.
    pub fn validate(&self) -> Result<(), ModelError> {
        let (offset, scale) = self.params();
        if offset.len() != scale.len() {
            return Err(ModelError::ShapeMismatch {
                expected: offset.len(),
                found: scale.len(),
            });
        }
        if scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(ModelError::Backend(
                "scaler has a zero or non-finite scale".to_string(),
            ));
        }
        Ok(())
    }

    fn params(&self) -> (&[f64], &[f64]) {
        match self {
            ScalerArtifact::Standard { mean, scale } => (mean, scale),
            ScalerArtifact::MinMax { min, scale } => (min, scale),
        }
    }

    fn scale_row(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_width(self.columns(), row.len())?;
        let scaled = match self {
            ScalerArtifact::Standard { mean, scale } => row
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(x, (m, s))| (x - m) / s)
                .collect(),
            ScalerArtifact::MinMax { min, scale } => row
                .iter()
                .zip(min.iter().zip(scale))
                .map(|(x, (m, s))| x * s + m)
                .collect(),
        };
        Ok(scaled)
    }
}

fn check_width(expected: usize, found: usize) -> Result<(), ModelError> {
    if expected != found {
        return Err(ModelError::ShapeMismatch { expected, found });
    }
    Ok(())
}

impl Scaler for ScalerArtifact {
    fn transform(&self, rows: &[Vec<f64>]) -> Result<Matrix, ModelError> {
        rows.iter().map(|row| self.scale_row(row)).collect()
    }

    fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_width(self.columns(), values.len())?;
        let restored = match self {
            ScalerArtifact::Standard { mean, scale } => values
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(x, (m, s))| x * s + m)
                .collect(),
            ScalerArtifact::MinMax { min, scale } => values
                .iter()
                .zip(min.iter().zip(scale))
                .map(|(x, (m, s))| (x - m) / s)
                .collect(),
        };
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scaler_transform_and_inverse() {
        let scaler = ScalerArtifact::Standard {
            mean: vec![10.0, 0.0],
            scale: vec![2.0, 4.0],
        };
        let scaled = scaler.transform(&[vec![14.0, 8.0], vec![10.0, -4.0]]).unwrap();
        assert_eq!(scaled, vec![vec![2.0, 2.0], vec![0.0, -1.0]]);
        assert_eq!(scaler.inverse_transform(&[2.0, 2.0]).unwrap(), vec![14.0, 8.0]);
    }

    #[test]
    fn test_min_max_scaler_transform_and_inverse() {
        let scaler = ScalerArtifact::MinMax {
            min: vec![-0.5],
            scale: vec![0.01],
        };
        let scaled = scaler.transform(&[vec![100.0]]).unwrap();
        assert!((scaled[0][0] - 0.5).abs() < 1e-12);
        let restored = scaler.inverse_transform(&[0.5]).unwrap();
        assert!((restored[0] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_width_mismatch_is_reported() {
        let scaler = ScalerArtifact::Standard {
            mean: vec![0.0; 5],
            scale: vec![1.0; 5],
        };
        assert_eq!(
            scaler.transform(&[vec![1.0; 4]]),
            Err(ModelError::ShapeMismatch {
                expected: 5,
                found: 4
            })
        );
        assert!(scaler.inverse_transform(&[1.0]).is_err());
    }

    #[test]
    fn test_deserializes_tagged_json() {
        let json = r#"{"kind": "min_max", "min": [0.0, 1.0], "scale": [0.5, 0.25]}"#;
        let scaler: ScalerArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(scaler.columns(), 2);
        assert!(scaler.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_scale_and_mismatched_params() {
        let zero = ScalerArtifact::Standard {
            mean: vec![0.0],
            scale: vec![0.0],
        };
        assert!(zero.validate().is_err());
        let uneven = ScalerArtifact::MinMax {
            min: vec![0.0, 0.0],
            scale: vec![1.0],
        };
        assert!(uneven.validate().is_err());
    }
}
