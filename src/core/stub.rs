use async_trait::async_trait;

use super::predictor::Predictor;
use crate::error::PredictionError;
use crate::models::prediction::{Contribution, FeatureContribution, Label, PredictionResult};
use crate::models::request::PredictionRequest;

/// Deterministic predictor that answers every request with the same result.
///
/// Used for offline demos and tests; no network access.
#[derive(Debug, Clone)]
pub struct StubPredictor {
    result: PredictionResult,
}

impl StubPredictor {
    pub fn new(result: PredictionResult) -> Self {
        Self { result }
    }
}

impl Default for StubPredictor {
    fn default() -> Self {
        Self::new(PredictionResult {
            probability: 0.64,
            label: Label::NoShow,
            top_features: vec![
                feature("past_no_shows", 0.22),
                feature("sms_received", -0.09),
                feature("lead_time_days", 0.06),
            ],
            recommended_action: "Call the patient to confirm the appointment.".to_string(),
            explanation_html: "<p>Prior missed appointments raise the risk; \
                an SMS reminder lowers it slightly.</p>"
                .to_string(),
        })
    }
}

fn feature(name: &str, contribution: f64) -> FeatureContribution {
    FeatureContribution {
        name: name.to_string(),
        contribution: Contribution::Number(contribution),
    }
}

#[async_trait]
impl Predictor for StubPredictor {
    async fn predict(&self, _request: &PredictionRequest) -> Result<PredictionResult, PredictionError> {
        Ok(self.result.clone())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
