//! Display values derived from predictions for the dashboard.
//!
//! Nothing here changes what the predictor said: the label shown is always
//! the label returned, whatever the probability.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::prediction::{AuditLogEntry, Contribution, FeatureContribution, Label, PredictionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Certainty is distance from a coin flip, scaled to `[0, 1]`.
pub fn confidence(probability: f64) -> Confidence {
    let certainty = (probability - 0.5).abs() * 2.0;
    if certainty > 0.8 {
        Confidence::High
    } else if certainty > 0.4 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

pub fn risk_label(label: Label) -> &'static str {
    match label {
        Label::NoShow => "At Risk of No-Show",
        Label::Attend => "Likely to Attend",
    }
}

pub fn badge(label: Label) -> &'static str {
    match label {
        Label::NoShow => "At Risk",
        Label::Attend => "Likely to Attend",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Pushes toward no-show.
    Up,
    /// Pushes toward attending.
    Down,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureView {
    pub name: String,
    pub display: String,
    pub direction: Direction,
}

impl From<&FeatureContribution> for FeatureView {
    fn from(feature: &FeatureContribution) -> Self {
        let (display, direction) = match &feature.contribution {
            Contribution::Number(n) => {
                let sign = if *n > 0.0 { "+" } else { "" };
                let direction = if *n > 0.0 { Direction::Up } else { Direction::Down };
                (format!("{}{:.1}%", sign, n * 100.0), direction)
            }
            Contribution::Text(text) => (text.clone(), Direction::Unknown),
        };
        Self {
            name: feature.name.clone(),
            display,
            direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionView {
    pub probability: f64,
    pub risk_percent: u32,
    pub label: Label,
    pub risk_label: &'static str,
    pub confidence: Confidence,
    pub above_threshold: bool,
    pub features: Vec<FeatureView>,
    pub recommended_action: String,
    pub explanation_html: String,
}

impl PredictionView {
    /// `threshold_percent` only drives the `above_threshold` flag.
    pub fn new(prediction: &PredictionResult, threshold_percent: u8) -> Self {
        Self {
            probability: prediction.probability,
            risk_percent: percent(prediction.probability),
            label: prediction.label,
            risk_label: risk_label(prediction.label),
            confidence: confidence(prediction.probability),
            above_threshold: prediction.probability * 100.0 > f64::from(threshold_percent),
            features: prediction.top_features.iter().map(FeatureView::from).collect(),
            recommended_action: prediction.recommended_action.clone(),
            explanation_html: prediction.explanation_html.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRow {
    pub id: String,
    pub short_id: String,
    pub patient_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub risk_percent: u32,
    pub badge: &'static str,
}

impl From<&AuditLogEntry> for AuditRow {
    fn from(entry: &AuditLogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            short_id: entry.id.chars().take(8).collect(),
            patient_id: entry.request.patient_id.clone(),
            timestamp: entry.timestamp,
            risk_percent: percent(entry.prediction.probability),
            badge: badge(entry.prediction.label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub probability: f64,
}

/// Chart series, oldest first.
pub fn history_series<'a>(entries: impl DoubleEndedIterator<Item = &'a AuditLogEntry>) -> Vec<HistoryPoint> {
    entries
        .rev()
        .map(|e| HistoryPoint {
            timestamp: e.timestamp,
            probability: e.prediction.probability,
        })
        .collect()
}

fn percent(probability: f64) -> u32 {
    (probability * 100.0).round().clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn prediction(probability: f64, label: Label) -> PredictionResult {
        PredictionResult {
            probability,
            label,
            top_features: vec![
                FeatureContribution { name: "past_no_shows".into(), contribution: Contribution::Number(0.123) },
                FeatureContribution { name: "sms_received".into(), contribution: Contribution::Number(-0.05) },
                FeatureContribution { name: "distance".into(), contribution: Contribution::Text("moderate".into()) },
            ],
            recommended_action: "Send an SMS reminder.".into(),
            explanation_html: "<p>ok</p>".into(),
        }
    }

    #[test_case(0.5, Confidence::Low ; "coin flip")]
    #[test_case(0.75, Confidence::Medium ; "leaning")]
    #[test_case(0.95, Confidence::High ; "near certain no show")]
    #[test_case(0.02, Confidence::High ; "near certain attend")]
    fn confidence_bands(probability: f64, expected: Confidence) {
        assert_eq!(confidence(probability), expected);
    }

    #[test]
    fn features_render_signed_percentages() {
        let view = PredictionView::new(&prediction(0.7, Label::NoShow), 50);
        let displays: Vec<_> = view.features.iter().map(|f| f.display.as_str()).collect();
        assert_eq!(displays, vec!["+12.3%", "-5.0%", "moderate"]);
        assert_eq!(view.features[0].direction, Direction::Up);
        assert_eq!(view.features[1].direction, Direction::Down);
        assert_eq!(view.features[2].direction, Direction::Unknown);
    }

    #[test]
    fn returned_label_is_displayed_even_when_inconsistent() {
        let view = PredictionView::new(&prediction(0.9, Label::Attend), 50);
        assert_eq!(view.risk_label, "Likely to Attend");
        assert_eq!(view.risk_percent, 90);
        assert!(view.above_threshold);
    }

    #[test]
    fn threshold_only_sets_flag() {
        let view = PredictionView::new(&prediction(0.6, Label::NoShow), 70);
        assert!(!view.above_threshold);
        assert_eq!(view.label, Label::NoShow);
    }
}
