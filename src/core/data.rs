//! Validation and coercion of raw prediction form input.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use validator::Validate;

use crate::error::ValidationError;
use crate::models::request::{Gender, PredictionRequest, RawForm};

pub const APPOINTMENT_BEFORE_SCHEDULED: &str =
    "Appointment date must be on or after the scheduled date.";

pub const COUNT_TOO_LARGE: &str = "Must be at most 4294967295.";

// Reporting order for collected errors; mirrors the form layout.
const FIELD_ORDER: [&str; 9] = [
    "patient_id",
    "age",
    "gender",
    "scheduled_at",
    "appointment_at",
    "sms_received",
    "comorbidity_count",
    "neighbourhood",
    "past_no_shows",
];

/// Range and presence rules that apply once values have been coerced.
#[derive(Debug, Validate)]
struct CoercedForm {
    #[validate(range(min = 0, max = 120, message = "Age must be between 0 and 120."))]
    age: Option<i64>,
    #[validate(range(min = 0, message = "Count must be 0 or greater."))]
    comorbidity_count: Option<i64>,
    #[validate(length(min = 1, message = "Neighbourhood is required."))]
    neighbourhood: String,
    #[validate(range(min = 0, message = "Must be 0 or greater."))]
    past_no_shows: Option<i64>,
}

/// Validate and coerce a raw form into a [`PredictionRequest`].
///
/// Every field is checked and all problems are returned together so the form
/// can flag each offending input at once.
pub fn validate(raw: &RawForm) -> Result<PredictionRequest, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let patient_id = coerce_patient_id(lookup(raw, &["patient_id"]), &mut errors);
    let age = match lookup(raw, &["age"]) {
        None => {
            errors.push(ValidationError::new("age", "Age is required."));
            None
        }
        Some(value) => coerce_whole("age", value, &mut errors),
    };
    let gender = coerce_gender(lookup(raw, &["gender"]), &mut errors);
    let scheduled_at = coerce_timestamp(
        "scheduled_at",
        lookup(raw, &["scheduled_at", "scheduled_iso"]),
        "Scheduled date is required.",
        &mut errors,
    );
    let appointment_at = coerce_timestamp(
        "appointment_at",
        lookup(raw, &["appointment_at", "appointment_iso"]),
        "Appointment date is required.",
        &mut errors,
    );
    let sms_received = coerce_bool("sms_received", lookup(raw, &["sms_received"]), &mut errors);
    let comorbidity_count = lookup(raw, &["comorbidity_count", "comorb_count"])
        .map_or(Some(0), |v| coerce_count("comorbidity_count", v, &mut errors));
    let past_no_shows = lookup(raw, &["past_no_shows"])
        .map_or(Some(0), |v| coerce_count("past_no_shows", v, &mut errors));
    let neighbourhood = match lookup(raw, &["neighbourhood"]) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };

    let coerced = CoercedForm {
        age,
        comorbidity_count,
        neighbourhood,
        past_no_shows,
    };
    if let Err(report) = coerced.validate() {
        for (field, field_errors) in report.field_errors() {
            for err in field_errors {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                errors.push(ValidationError::new(field, message));
            }
        }
    }

    if let (Some(scheduled), Some(appointment)) = (scheduled_at, appointment_at) {
        if appointment < scheduled {
            errors.push(ValidationError::new("appointment_at", APPOINTMENT_BEFORE_SCHEDULED));
        }
    }

    if !errors.is_empty() {
        errors.sort_by_key(|e| field_rank(&e.field));
        return Err(errors);
    }

    let age = age.and_then(|n| u8::try_from(n).ok());
    let comorbidity_count = comorbidity_count.and_then(|n| u32::try_from(n).ok());
    let past_no_shows = past_no_shows.and_then(|n| u32::try_from(n).ok());

    match (age, gender, scheduled_at, appointment_at, comorbidity_count, past_no_shows) {
        (Some(age), Some(gender), Some(scheduled_at), Some(appointment_at), Some(comorbidity_count), Some(past_no_shows)) => {
            Ok(PredictionRequest {
                patient_id,
                age,
                gender,
                scheduled_at,
                appointment_at,
                sms_received,
                comorbidity_count,
                neighbourhood: coerced.neighbourhood,
                past_no_shows,
            })
        }
        // Every None above has already pushed an error.
        _ => Err(vec![ValidationError::new("form", "Form is incomplete.")]),
    }
}

/// Layer `edits` over `base`; keys present in `edits` win.
pub fn merge_forms(base: &RawForm, edits: &RawForm) -> RawForm {
    let mut merged = base.clone();
    for (key, value) in edits {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn field_rank(field: &str) -> usize {
    FIELD_ORDER
        .iter()
        .position(|f| *f == field)
        .unwrap_or(FIELD_ORDER.len())
}

/// First present, non-null value among `keys`. Empty strings count as absent.
fn lookup<'a>(raw: &'a RawForm, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
}

fn coerce_patient_id(value: Option<&Value>, errors: &mut Vec<ValidationError>) -> Option<String> {
    match value {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(_) => {
            errors.push(ValidationError::new("patient_id", "Patient ID must be text."));
            None
        }
    }
}

fn coerce_whole(field: &'static str, value: &Value, errors: &mut Vec<ValidationError>) -> Option<i64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() && n.fract() == 0.0 => Some(n as i64),
        Some(n) if n.is_finite() => {
            errors.push(ValidationError::new(field, "Must be a whole number."));
            None
        }
        _ => {
            errors.push(ValidationError::new(field, "Must be a number."));
            None
        }
    }
}

/// A whole number that must also fit the request's `u32` counts.
fn coerce_count(field: &'static str, value: &Value, errors: &mut Vec<ValidationError>) -> Option<i64> {
    let count = coerce_whole(field, value, errors)?;
    if count > i64::from(u32::MAX) {
        errors.push(ValidationError::new(field, COUNT_TOO_LARGE));
        return None;
    }
    Some(count)
}

fn coerce_gender(value: Option<&Value>, errors: &mut Vec<ValidationError>) -> Option<Gender> {
    match value {
        None => {
            errors.push(ValidationError::new("gender", "Gender is required."));
            None
        }
        Some(Value::String(s)) => {
            let gender = Gender::parse(s);
            if gender.is_none() {
                errors.push(ValidationError::new("gender", "Gender must be one of male, female, other."));
            }
            gender
        }
        Some(_) => {
            errors.push(ValidationError::new("gender", "Gender must be one of male, female, other."));
            None
        }
    }
}

fn coerce_bool(field: &'static str, value: Option<&Value>, errors: &mut Vec<ValidationError>) -> bool {
    match value {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) if s.trim() == "true" => true,
        Some(Value::String(s)) if s.trim() == "false" => false,
        Some(_) => {
            errors.push(ValidationError::new(field, "Must be true or false."));
            false
        }
    }
}

fn coerce_timestamp(
    field: &'static str,
    value: Option<&Value>,
    missing: &'static str,
    errors: &mut Vec<ValidationError>,
) -> Option<DateTime<Utc>> {
    let parsed = match value {
        None => {
            errors.push(ValidationError::new(field, missing));
            return None;
        }
        Some(Value::String(s)) => parse_timestamp(s.trim()),
        Some(_) => None,
    };
    if parsed.is_none() {
        errors.push(ValidationError::new(field, "Must be a valid ISO-8601 timestamp."));
    }
    parsed
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    // Date pickers send bare dates; treat them as midnight UTC.
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
