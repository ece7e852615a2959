//! API module for NoShow Sentinel
//!
//! HTTP surface the dashboard front end uses to drive its prediction session.

pub mod handlers;
pub mod middleware;
pub mod routes;

use std::sync::Arc;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::PredictionError;
use crate::session::{PredictionSession, SessionError, Simulation};

pub use routes::configure;

/// Shared application state
pub struct AppState {
    pub session: Arc<PredictionSession>,
    pub simulation: Mutex<Option<Simulation>>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, config::ConfigError> {
        let predictor = config.predictor.build()?;
        let session = PredictionSession::new(predictor, config.session.history_capacity);
        Ok(Self::with_session(Arc::new(session), config))
    }

    pub fn with_session(session: Arc<PredictionSession>, config: Config) -> Self {
        Self {
            session,
            simulation: Mutex::new(None),
            config,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Session(SessionError::Invalid(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Session(SessionError::Busy) => StatusCode::CONFLICT,
            ApiError::Session(SessionError::UnknownEntry(_)) => StatusCode::NOT_FOUND,
            ApiError::Session(SessionError::Prediction(_)) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Session(SessionError::Invalid(errors)) => json!({ "errors": errors }),
            ApiError::Session(SessionError::Prediction(err)) => {
                let kind = match err {
                    PredictionError::Malformed(_) => "malformed",
                    _ => "transport",
                };
                json!({
                    "error": "There was an error generating the prediction. Please try again.",
                    "kind": kind,
                    "detail": err.to_string(),
                })
            }
            other => json!({ "error": other.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
