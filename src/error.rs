//! Error types shared across the crate.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// A user-correctable problem with a single form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure of a single predictor round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionError {
    /// The predictor answered with a non-success status.
    #[error("predictor returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The predictor could not be reached or the exchange broke off.
    #[error("predictor request failed: {0}")]
    Transport(String),

    /// The predictor answered, but not with a valid prediction.
    #[error("malformed predictor response: {0}")]
    Malformed(String),
}

impl PredictionError {
    /// True for failures reaching the predictor, as opposed to bad output.
    pub fn is_transport(&self) -> bool {
        matches!(self, PredictionError::Http { .. } | PredictionError::Transport(_))
    }
}

impl From<reqwest::Error> for PredictionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PredictionError::Malformed(err.to_string())
        } else {
            PredictionError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PredictionError {
    fn from(err: serde_json::Error) -> Self {
        PredictionError::Malformed(err.to_string())
    }
}

/// Renders collected field errors as one line, for logs and error chains.
pub fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
