//! The dashboard's prediction session.
//!
//! One session owns the current prediction, the audit log and the lifecycle
//! phase. Every predictor call is tagged with a generation number; a result
//! is applied only if its generation is still the latest when it arrives, so
//! canceled or superseded calls can never overwrite newer state.

pub mod simulation;

use std::sync::Arc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::core::audit::AuditLog;
use crate::core::data;
use crate::core::predictor::Predictor;
use crate::core::view::{self, HistoryPoint};
use crate::error::{join_errors, PredictionError, ValidationError};
use crate::models::prediction::{AuditLogEntry, PredictionResult};
use crate::models::request::{PredictionRequest, RawForm};

pub use simulation::Simulation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid prediction input: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),

    #[error("a prediction is already in progress")]
    Busy,

    #[error("no audit entry with id {0}")]
    UnknownEntry(String),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

/// What became of a predictor call once it returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied(PredictionResult),
    /// Canceled or superseded while in flight; state was left untouched.
    Discarded,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub current: Option<PredictionResult>,
    pub last_error: Option<String>,
    pub audit: Vec<AuditLogEntry>,
}

#[derive(Debug)]
struct SessionState {
    phase: Phase,
    generation: u64,
    current: Option<PredictionResult>,
    last_error: Option<String>,
    audit: AuditLog,
}

pub struct PredictionSession {
    predictor: Arc<dyn Predictor>,
    state: Arc<Mutex<SessionState>>,
}

/// Held while a predictor call is outstanding. If the call's future is
/// dropped before its result is applied, the session leaves `Submitting`
/// and the generation moves on, as if the call had been canceled.
struct InFlight {
    state: Arc<Mutex<SessionState>>,
    generation: u64,
}

impl InFlight {
    fn release(state: &mut SessionState, generation: u64) {
        if state.generation == generation && state.phase == Phase::Submitting {
            state.phase = Phase::Idle;
            state.generation += 1;
            warn!(generation, "Prediction abandoned before its result arrived");
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let generation = self.generation;
        match self.state.try_lock() {
            Ok(mut state) => Self::release(&mut state, generation),
            Err(_) => {
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    let state = self.state.clone();
                    handle.spawn(async move {
                        Self::release(&mut *state.lock().await, generation);
                    });
                }
            }
        }
    }
}

impl PredictionSession {
    pub fn new(predictor: Arc<dyn Predictor>, history_capacity: usize) -> Self {
        Self {
            predictor,
            state: Arc::new(Mutex::new(SessionState {
                phase: Phase::Idle,
                generation: 0,
                current: None,
                last_error: None,
                audit: AuditLog::with_capacity(history_capacity),
            })),
        }
    }

    /// Validate a form and run one prediction for it.
    ///
    /// Rejected with [`SessionError::Busy`] while another submission is in
    /// flight. Validation failures never reach the predictor.
    pub async fn submit(&self, raw: &RawForm) -> Result<Outcome, SessionError> {
        let request = data::validate(raw).map_err(SessionError::Invalid)?;

        let generation = {
            let mut state = self.state.lock().await;
            if state.phase == Phase::Submitting {
                return Err(SessionError::Busy);
            }
            state.phase = Phase::Submitting;
            state.generation += 1;
            state.generation
        };

        info!(generation, "Submitting prediction request");
        self.run(generation, request).await
    }

    /// Re-predict for simulation mode.
    ///
    /// Not gated on the phase: overlapping calls are allowed and only the
    /// most recently started one may apply its result.
    pub async fn simulate(&self, request: PredictionRequest) -> Result<Outcome, SessionError> {
        let generation = {
            let mut state = self.state.lock().await;
            state.phase = Phase::Submitting;
            state.generation += 1;
            state.generation
        };

        debug!(generation, "Running simulation prediction");
        self.run(generation, request).await
    }

    /// Drop back to idle. The in-flight call is not aborted, but its result
    /// will be discarded when it arrives. Returns false if nothing was
    /// in flight.
    pub async fn cancel(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.phase != Phase::Submitting {
            return false;
        }
        state.phase = Phase::Idle;
        state.generation += 1;
        info!(generation = state.generation, "Prediction canceled");
        true
    }

    /// Return to idle after a finished prediction has been shown.
    pub async fn acknowledge(&self) {
        let mut state = self.state.lock().await;
        if matches!(state.phase, Phase::Succeeded | Phase::Failed) {
            state.phase = Phase::Idle;
        }
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase
    }

    pub async fn current(&self) -> Option<PredictionResult> {
        self.state.lock().await.current.clone()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            phase: state.phase,
            current: state.current.clone(),
            last_error: state.last_error.clone(),
            audit: state.audit.to_vec(),
        }
    }

    pub async fn audit(&self) -> Vec<AuditLogEntry> {
        self.state.lock().await.audit.to_vec()
    }

    pub async fn history(&self) -> Vec<HistoryPoint> {
        let state = self.state.lock().await;
        view::history_series(state.audit.entries())
    }

    pub async fn clear_audit(&self) {
        self.state.lock().await.audit.clear();
    }

    /// The request behind an audit entry, for seeding simulation mode.
    /// `None` picks the most recent entry.
    pub async fn simulation_seed(&self, entry_id: Option<&str>) -> Result<PredictionRequest, SessionError> {
        let state = self.state.lock().await;
        let entry = match entry_id {
            Some(id) => state.audit.get(id),
            None => state.audit.latest(),
        };
        entry
            .map(|e| e.request.clone())
            .ok_or_else(|| SessionError::UnknownEntry(entry_id.unwrap_or("latest").to_string()))
    }

    async fn run(&self, generation: u64, request: PredictionRequest) -> Result<Outcome, SessionError> {
        let _in_flight = InFlight {
            state: self.state.clone(),
            generation,
        };
        let outcome = self.predictor.predict(&request).await;
        self.apply(generation, request, outcome).await
    }

    async fn apply(
        &self,
        generation: u64,
        request: PredictionRequest,
        outcome: Result<PredictionResult, PredictionError>,
    ) -> Result<Outcome, SessionError> {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(generation, latest = state.generation, "Discarding stale prediction result");
            return Ok(Outcome::Discarded);
        }

        match outcome {
            Ok(prediction) => {
                info!(
                    generation,
                    probability = prediction.probability,
                    label = %prediction.label,
                    "Prediction applied"
                );
                state.phase = Phase::Succeeded;
                state.current = Some(prediction.clone());
                state.last_error = None;
                state.audit.append(AuditLogEntry::new(request, prediction.clone()));
                Ok(Outcome::Applied(prediction))
            }
            Err(err) => {
                if err.is_transport() {
                    error!(generation, "Prediction transport failure: {}", err);
                } else {
                    warn!(generation, "Predictor returned malformed output: {}", err);
                }
                state.phase = Phase::Failed;
                state.current = None;
                state.last_error = Some(err.to_string());
                Err(SessionError::Prediction(err))
            }
        }
    }
}
