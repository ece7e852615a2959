use std::fmt;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Deserialize};

/// Unvalidated form input as it arrives from the dashboard.
pub type RawForm = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated prediction request.
///
/// Only [`crate::core::data::validate`] builds these from raw input, so every
/// instance satisfies the range limits and `appointment_at >= scheduled_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub patient_id: Option<String>,
    pub age: u8,
    pub gender: Gender,
    pub scheduled_at: DateTime<Utc>,
    pub appointment_at: DateTime<Utc>,
    pub sms_received: bool,
    pub comorbidity_count: u32,
    pub neighbourhood: String,
    pub past_no_shows: u32,
}

impl PredictionRequest {
    /// Wire payload sent to the external predictor.
    pub fn to_payload(&self) -> PredictionPayload {
        PredictionPayload {
            patient_id: self.patient_id.clone(),
            age: self.age,
            gender: self.gender,
            scheduled_iso: iso(&self.scheduled_at),
            appointment_iso: iso(&self.appointment_at),
            sms_received: self.sms_received,
            comorb_count: self.comorbidity_count,
            neighbourhood: self.neighbourhood.clone(),
            past_no_shows: Some(self.past_no_shows),
        }
    }

    /// Inverse of [`PredictionRequest::to_payload`], as a raw form.
    ///
    /// Simulation mode starts from this and layers the user's edits on top.
    pub fn to_form(&self) -> RawForm {
        match serde_json::to_value(self.to_payload()) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => RawForm::new(),
        }
    }
}

/// Boundary payload; field names are fixed by the predictor contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    pub age: u8,
    pub gender: Gender,
    pub scheduled_iso: String,
    pub appointment_iso: String,
    pub sms_received: bool,
    pub comorb_count: u32,
    pub neighbourhood: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub past_no_shows: Option<u32>,
}

fn iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
