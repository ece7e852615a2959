//! Schema checks for predictor output.

use serde_json::Value;

use crate::error::PredictionError;
use crate::models::prediction::PredictionResult;

/// Parse a predictor reply into a [`PredictionResult`].
///
/// Missing fields, a label outside the enum, or a probability outside
/// `[0, 1]` are all rejected; nothing is coerced.
pub fn parse_result(value: Value) -> Result<PredictionResult, PredictionError> {
    if !value.is_object() {
        return Err(PredictionError::Malformed(format!(
            "expected a JSON object, got {}",
            kind(&value)
        )));
    }
    let result: PredictionResult = serde_json::from_value(value)?;
    check(&result)?;
    Ok(result)
}

/// Parse a predictor reply given as text.
pub fn parse_result_str(body: &str) -> Result<PredictionResult, PredictionError> {
    let value: Value = serde_json::from_str(body)?;
    parse_result(value)
}

fn check(result: &PredictionResult) -> Result<(), PredictionError> {
    if !(0.0..=1.0).contains(&result.probability) {
        return Err(PredictionError::Malformed(format!(
            "probability {} is outside [0, 1]",
            result.probability
        )));
    }
    if let Some(feature) = result.top_features.iter().find(|f| f.name.trim().is_empty()) {
        return Err(PredictionError::Malformed(format!(
            "feature with contribution {:?} has no name",
            feature.contribution
        )));
    }
    Ok(())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::prediction::{Contribution, Label};
    use serde_json::json;

    fn reply() -> Value {
        json!({
            "probability": 0.72,
            "label": "no-show",
            "top_features": [
                { "name": "past_no_shows", "contribution": 0.31 },
                { "name": "sms_received", "contribution": -0.12 },
                { "name": "lead_time_days", "contribution": "+0.08" }
            ],
            "recommended_action": "Call the patient the day before.",
            "explanation_html": "<p>Two prior no-shows.</p>"
        })
    }

    #[test]
    fn accepts_well_formed_reply() {
        let result = parse_result(reply()).unwrap();
        assert_eq!(result.label, Label::NoShow);
        assert_eq!(result.top_features.len(), 3);
        assert_eq!(result.top_features[1].contribution, Contribution::Number(-0.12));
        assert_eq!(result.top_features[2].contribution, Contribution::Text("+0.08".into()));
    }

    #[test]
    fn label_and_probability_are_not_cross_checked() {
        let mut value = reply();
        value["label"] = json!("attend");
        let result = parse_result(value).unwrap();
        assert_eq!(result.label, Label::Attend);
        assert_eq!(result.probability, 0.72);
    }

    #[test]
    fn missing_probability_is_malformed() {
        let mut value = reply();
        value.as_object_mut().unwrap().remove("probability");
        assert!(matches!(parse_result(value), Err(PredictionError::Malformed(_))));
    }

    #[test]
    fn unknown_label_is_malformed() {
        let mut value = reply();
        value["label"] = json!("maybe");
        assert!(matches!(parse_result(value), Err(PredictionError::Malformed(_))));
    }

    #[test]
    fn probability_out_of_range_is_malformed() {
        let mut value = reply();
        value["probability"] = json!(1.4);
        assert!(matches!(parse_result(value), Err(PredictionError::Malformed(_))));
    }

    #[test]
    fn non_object_and_non_json_are_malformed() {
        assert!(matches!(parse_result(json!([1, 2])), Err(PredictionError::Malformed(_))));
        assert!(matches!(parse_result_str("<html>oops</html>"), Err(PredictionError::Malformed(_))));
    }
}
