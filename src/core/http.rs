//! Prediction over a plain HTTP endpoint.

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, error, instrument};
use url::Url;

use super::predictor::Predictor;
use super::response;
use crate::error::PredictionError;
use crate::models::prediction::PredictionResult;
use crate::models::request::PredictionRequest;

/// POSTs the request payload to a prediction service and parses its reply.
///
/// No timeout or retry is applied here; a slow service keeps the session in
/// its submitting state until the user cancels.
pub struct HttpPredictor {
    client: Client,
    endpoint: Url,
}

impl HttpPredictor {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, PredictionError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(CACHE_CONTROL, "no-store")
            .json(&request.to_payload())
            .send()
            .await
            .map_err(|e| {
                error!("Prediction endpoint unreachable: {}", e);
                PredictionError::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PredictionError::Transport(e.to_string()))?;

        if !status.is_success() {
            error!("Prediction endpoint returned {}: {}", status, body);
            return Err(PredictionError::Http {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Prediction endpoint replied with {} bytes", body.len());
        response::parse_result_str(&body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
