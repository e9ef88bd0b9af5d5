/// Remote sequence-model client.
///
/// Calls a model server exposing a TensorFlow-Serving style REST endpoint:
///
///   POST {base}/v1/models/{name}:predict
///   {"instances": [[[f, f, ...], ...]]}      one 30×11 window
///   -> {"predictions": [[r0, r1, ...]]}       residual(s) for that window
///
/// The call is blocking. Any transport, status or decoding failure is
/// reported as `ModelError::Backend`, which the forecast engine surfaces as
/// a model invocation failure.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ArtifactError, SequenceRegressor};
use crate::model::ModelError;

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: [&'a [Vec<f64>]; 1],
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f64>>,
}

pub struct RemoteSequenceModel {
    client: reqwest::blocking::Client,
    url: String,
}

impl RemoteSequenceModel {
    /// Builds a client for `{base_url}/v1/models/{model_name}:predict`.
    pub fn new(base_url: &str, model_name: &str, timeout: Duration) -> Result<Self, ArtifactError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ArtifactError::Client(e.to_string()))?;
        Ok(Self {
            client,
            url: predict_url(base_url, model_name),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Builds the `:predict` URL, tolerating a trailing slash on the base.
pub fn predict_url(base_url: &str, model_name: &str) -> String {
    format!(
        "{}/v1/models/{}:predict",
        base_url.trim_end_matches('/'),
        model_name
    )
}

impl SequenceRegressor for RemoteSequenceModel {
    fn predict(&self, window: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let body = PredictRequest { instances: [window] };

        let response = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .map_err(|e| ModelError::Backend(format!("request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(ModelError::Backend(format!(
                "HTTP error: {}",
                response.status().as_u16()
            )));
        }

        let text = response
            .text()
            .map_err(|e| ModelError::Backend(format!("failed to read response: {}", e)))?;
        parse_predictions(&text)
    }
}

/// Extracts the residuals for the single submitted window.
pub fn parse_predictions(body: &str) -> Result<Vec<f64>, ModelError> {
    let parsed: PredictResponse = serde_json::from_str(body)
        .map_err(|e| ModelError::Backend(format!("Parse error: {}", e)))?;
    parsed
        .predictions
        .into_iter()
        .next()
        .filter(|residuals| !residuals.is_empty())
        .ok_or_else(|| ModelError::Backend("response contained no predictions".to_string()))
}
