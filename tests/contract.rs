use serde_json::{json, Value};

use sentinel::core::data::{validate, APPOINTMENT_BEFORE_SCHEDULED};
use sentinel::core::response::parse_result;
use sentinel::error::PredictionError;
use sentinel::models::RawForm;

fn form(overrides: Value) -> RawForm {
    let mut base = json!({
        "age": 45,
        "gender": "female",
        "scheduled_iso": "2024-01-01T09:00:00Z",
        "appointment_iso": "2024-01-01T09:00:00Z",
        "sms_received": true,
        "comorb_count": 1,
        "neighbourhood": "Downtown",
        "past_no_shows": 2
    });
    if let (Some(map), Some(extra)) = (base.as_object_mut(), overrides.as_object()) {
        for (k, v) in extra {
            map.insert(k.clone(), v.clone());
        }
    }
    base.as_object().cloned().unwrap()
}

#[test]
fn valid_inputs_coerce_into_bounds() {
    for age in [0, 1, 17, 64, 119, 120] {
        for count in ["0", "3", "12"] {
            let request = validate(&form(json!({
                "age": age.to_string(),
                "comorb_count": count,
                "past_no_shows": count,
            })))
            .unwrap();
            assert!(request.age <= 120);
            assert_eq!(request.age as i32, age);
            assert_eq!(request.comorbidity_count.to_string(), count);
            assert_eq!(request.past_no_shows.to_string(), count);
        }
    }
}

#[test]
fn reversed_dates_fail_on_appointment_field_whatever_else_is_wrong() {
    let cases = [
        json!({}),
        json!({ "gender": "robot" }),
        json!({ "age": -4, "neighbourhood": "" }),
        json!({ "comorb_count": "many" }),
    ];
    for overrides in cases {
        let mut overrides = overrides;
        overrides["appointment_iso"] = json!("2023-12-31T09:00:00Z");

        let errors = validate(&form(overrides)).unwrap_err();
        let on_appointment: Vec<_> = errors.iter().filter(|e| e.field == "appointment_at").collect();
        assert_eq!(on_appointment.len(), 1);
        assert_eq!(on_appointment[0].message, APPOINTMENT_BEFORE_SCHEDULED);
    }
}

#[test]
fn neighbourhood_missing_or_empty_fails() {
    for value in [Value::Null, json!(""), json!("   ")] {
        let errors = validate(&form(json!({ "neighbourhood": value }))).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "neighbourhood"));
    }
}

#[test]
fn predictor_output_is_never_coerced() {
    let malformed = [
        json!({ "label": "attend", "top_features": [], "recommended_action": "", "explanation_html": "" }),
        json!({ "probability": 0.2, "label": "unsure", "top_features": [], "recommended_action": "", "explanation_html": "" }),
        json!({ "probability": "0.2", "label": "attend", "top_features": [], "recommended_action": "", "explanation_html": "" }),
        json!({ "probability": 0.2, "label": "attend", "top_features": [{ "name": "age", "contribution": true }], "recommended_action": "", "explanation_html": "" }),
    ];
    for value in malformed {
        assert!(matches!(parse_result(value), Err(PredictionError::Malformed(_))));
    }
}
