//! Simulation mode: live re-prediction while the user edits inputs.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{Outcome, PredictionSession};
use crate::core::data;
use crate::error::join_errors;
use crate::models::request::{PredictionRequest, RawForm};

pub const DEFAULT_SETTLE: Duration = Duration::from_millis(500);

/// Debounced driver for [`PredictionSession::simulate`].
///
/// Edits are merged into the working form; once no edit has arrived for the
/// settle window, the form is validated and a prediction is started. Calls
/// may overlap and the session keeps only the newest result.
pub struct Simulation {
    form: watch::Sender<RawForm>,
    task: JoinHandle<()>,
}

impl Simulation {
    /// Start from the inputs of an earlier prediction.
    pub fn start(session: Arc<PredictionSession>, seed: &PredictionRequest, settle: Duration) -> Self {
        let (form, rx) = watch::channel(seed.to_form());
        let task = tokio::spawn(run(session, rx, settle));
        Self { form, task }
    }

    /// Merge `edits` into the working form and restart the settle timer.
    pub fn edit(&self, edits: &RawForm) {
        self.form.send_modify(|form| {
            *form = data::merge_forms(form, edits);
        });
    }

    /// Current working form, edits included.
    pub fn form(&self) -> RawForm {
        self.form.borrow().clone()
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(session: Arc<PredictionSession>, mut rx: watch::Receiver<RawForm>, settle: Duration) {
    while rx.changed().await.is_ok() {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(settle) => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }

        let form = rx.borrow_and_update().clone();
        let request = match data::validate(&form) {
            Ok(request) => request,
            Err(errors) => {
                warn!("Simulation input invalid, skipping: {}", join_errors(&errors));
                continue;
            }
        };

        let session = session.clone();
        tokio::spawn(async move {
            match session.simulate(request).await {
                Ok(Outcome::Applied(result)) => debug!(probability = result.probability, "Simulation updated"),
                Ok(Outcome::Discarded) => debug!("Simulation result superseded"),
                Err(err) => warn!("Simulation prediction failed: {}", err),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::predictor::Predictor;
    use crate::error::PredictionError;
    use crate::models::prediction::PredictionResult;
    use crate::core::stub::StubPredictor;
    use crate::session::tests::form;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every request it is asked about.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<PredictionRequest>>,
    }

    #[async_trait]
    impl Predictor for Recorder {
        async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, PredictionError> {
            self.seen.lock().unwrap().push(request.clone());
            StubPredictor::default().predict(request).await
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    fn edits(value: serde_json::Value) -> RawForm {
        value.as_object().cloned().unwrap()
    }

    fn seed() -> PredictionRequest {
        data::validate(&form()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_collapse_into_one_prediction() {
        let recorder = Arc::new(Recorder::default());
        let session = Arc::new(PredictionSession::new(recorder.clone(), 5));
        let sim = Simulation::start(session.clone(), &seed(), DEFAULT_SETTLE);

        sim.edit(&edits(json!({ "age": 50 })));
        tokio::time::sleep(Duration::from_millis(200)).await;
        sim.edit(&edits(json!({ "age": 55 })));
        tokio::time::sleep(Duration::from_millis(200)).await;
        sim.edit(&edits(json!({ "age": 60, "sms_received": false })));
        tokio::time::sleep(Duration::from_millis(800)).await;

        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].age, 60);
        assert!(!seen[0].sms_received);
        assert_eq!(seen[0].neighbourhood, "Downtown");
        assert_eq!(session.audit().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn settled_edits_each_predict() {
        let recorder = Arc::new(Recorder::default());
        let session = Arc::new(PredictionSession::new(recorder.clone(), 5));
        let sim = Simulation::start(session, &seed(), DEFAULT_SETTLE);

        sim.edit(&edits(json!({ "comorb_count": 4 })));
        tokio::time::sleep(Duration::from_millis(700)).await;
        sim.edit(&edits(json!({ "comorb_count": 5 })));
        tokio::time::sleep(Duration::from_millis(700)).await;

        let counts: Vec<u32> = recorder
            .seen
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.comorbidity_count)
            .collect();
        assert_eq!(counts, vec![4, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_edit_is_skipped() {
        let recorder = Arc::new(Recorder::default());
        let session = Arc::new(PredictionSession::new(recorder.clone(), 5));
        let sim = Simulation::start(session, &seed(), DEFAULT_SETTLE);

        sim.edit(&edits(json!({ "age": 300 })));
        tokio::time::sleep(Duration::from_millis(700)).await;

        assert!(recorder.seen.lock().unwrap().is_empty());
        assert_eq!(sim.form()["age"], json!(300));
    }
}
