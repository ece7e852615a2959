use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::{ApiError, AppState};
use crate::core::view::{AuditRow, PredictionView};
use crate::models::request::RawForm;
use crate::session::{Outcome, Phase, Simulation};

#[derive(Debug, Serialize)]
struct SessionResponse {
    phase: Phase,
    prediction: Option<PredictionView>,
    last_error: Option<String>,
    audit: Vec<AuditRow>,
    auto_reminders: bool,
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    /// Audit entry to seed from. Restarts a running simulation from that
    /// entry; without it a running simulation keeps its working form.
    pub entry_id: Option<String>,
    #[serde(default)]
    pub edits: RawForm,
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub async fn predict(state: web::Data<AppState>, form: web::Json<RawForm>) -> Result<HttpResponse, ApiError> {
    match state.session.submit(&form).await? {
        Outcome::Applied(prediction) => {
            let view = PredictionView::new(&prediction, state.config.display.risk_threshold);
            Ok(HttpResponse::Ok().json(json!({ "prediction": prediction, "view": view })))
        }
        Outcome::Discarded => Ok(HttpResponse::Accepted().json(json!({ "status": "discarded" }))),
    }
}

pub async fn cancel(state: web::Data<AppState>) -> HttpResponse {
    if state.session.cancel().await {
        info!("Prediction canceled by user");
    }
    session_response(&state).await
}

pub async fn session(state: web::Data<AppState>) -> HttpResponse {
    session_response(&state).await
}

pub async fn audit(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.session.audit().await)
}

pub async fn clear_audit(state: web::Data<AppState>) -> HttpResponse {
    state.session.clear_audit().await;
    HttpResponse::NoContent().finish()
}

pub async fn history(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.session.history().await)
}

pub async fn simulate(
    state: web::Data<AppState>,
    body: web::Json<SimulateRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut simulation = state.simulation.lock().await;
    let sim = match simulation.take() {
        Some(sim) if body.entry_id.is_none() => sim,
        running => {
            // An unknown entry leaves the running simulation untouched.
            let seed = state
                .session
                .simulation_seed(body.entry_id.as_deref())
                .await
                .map_err(|err| {
                    *simulation = running;
                    err
                })?;
            info!(entry_id = ?body.entry_id, "Simulation mode started");
            Simulation::start(state.session.clone(), &seed, state.config.session.simulation_debounce())
        }
    };
    sim.edit(&body.edits);
    let form = sim.form();
    *simulation = Some(sim);

    Ok(HttpResponse::Accepted().json(json!({ "status": "scheduled", "form": form })))
}

pub async fn stop_simulation(state: web::Data<AppState>) -> HttpResponse {
    if state.simulation.lock().await.take().is_some() {
        info!("Simulation mode stopped");
    }
    HttpResponse::NoContent().finish()
}

async fn session_response(state: &AppState) -> HttpResponse {
    let snapshot = state.session.snapshot().await;
    let threshold = state.config.display.risk_threshold;
    HttpResponse::Ok().json(SessionResponse {
        phase: snapshot.phase,
        prediction: snapshot.current.as_ref().map(|p| PredictionView::new(p, threshold)),
        last_error: snapshot.last_error,
        audit: snapshot.audit.iter().map(AuditRow::from).collect(),
        auto_reminders: state.config.display.auto_reminders,
    })
}
