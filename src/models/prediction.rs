use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use super::request::PredictionRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "no-show")]
    NoShow,
    #[serde(rename = "attend")]
    Attend,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::NoShow => "no-show",
            Label::Attend => "attend",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature contribution as returned by the predictor.
///
/// The prompt backend sometimes answers with prose ("+0.12", "high") instead
/// of a number; both are kept as-is and displayed verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Contribution {
    Number(f64),
    Text(String),
}

impl Contribution {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Contribution::Number(n) => Some(*n),
            Contribution::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub name: String,
    pub contribution: Contribution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub probability: f64,
    pub label: Label,
    pub top_features: Vec<FeatureContribution>,
    pub recommended_action: String,
    pub explanation_html: String,
}

/// One row of the rolling prediction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub request: PredictionRequest,
    pub prediction: PredictionResult,
}

impl AuditLogEntry {
    pub fn new(request: PredictionRequest, prediction: PredictionResult) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            request,
            prediction,
        }
    }
}
