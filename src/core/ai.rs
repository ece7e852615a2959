//! Prediction through a generative model prompt.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, instrument, warn};
use url::Url;

use super::predictor::Predictor;
use super::response;
use crate::error::PredictionError;
use crate::models::prediction::PredictionResult;
use crate::models::request::PredictionRequest;

const PREAMBLE: &str = "You are an AI assistant that predicts whether a patient will no-show \
for their medical appointment and explains the prediction. You answer with a single JSON object \
and nothing else.";

/// A text completion backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, preamble: &str, prompt: &str) -> Result<String, PredictionError>;
}

/// OpenAI-compatible chat completions client.
pub struct ChatCompletionModel {
    client: Client,
    endpoint: Url,
    model: String,
    api_key: String,
}

impl ChatCompletionModel {
    pub fn new(endpoint: Url, model: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            model,
            api_key,
        }
    }
}

#[async_trait]
impl CompletionModel for ChatCompletionModel {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, preamble: &str, prompt: &str) -> Result<String, PredictionError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": preamble },
                    { "role": "user", "content": prompt }
                ],
                "response_format": { "type": "json_object" }
            }))
            .send()
            .await
            .map_err(|e| PredictionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| PredictionError::Transport(e.to_string()))?;
            error!("Model endpoint returned {}: {}", status, body);
            return Err(PredictionError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let reply = response.json::<Value>().await?;
        reply["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| PredictionError::Malformed("completion has no message content".into()))
    }
}

/// Fills the prediction template, asks the model, and parses its JSON answer.
///
/// Output is not reproducible: the same request can yield different
/// contributions and wording on every call.
pub struct PromptPredictor<M> {
    model: M,
}

impl<M: CompletionModel> PromptPredictor<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<M: CompletionModel> Predictor for PromptPredictor<M> {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, PredictionError> {
        let prompt = render_prompt(request);
        debug!("Prompt rendered ({} chars)", prompt.len());

        let reply = self.model.complete(PREAMBLE, &prompt).await?;
        let body = extract_json(&reply).ok_or_else(|| {
            warn!("Model reply contained no JSON object");
            PredictionError::Malformed("model reply contained no JSON object".into())
        })?;
        response::parse_result_str(body)
    }

    fn name(&self) -> &'static str {
        "prompt"
    }
}

/// Render the prediction prompt. Absent optional values render empty.
pub fn render_prompt(request: &PredictionRequest) -> String {
    let payload = request.to_payload();
    format!(
        "Here is the patient data:\n\
         Patient ID: {patient_id}\n\
         Age: {age}\n\
         Gender: {gender}\n\
         Scheduled Date & Time: {scheduled}\n\
         Appointment Date & Time: {appointment}\n\
         SMS Received: {sms}\n\
         Comorbidity Count: {comorb}\n\
         Neighbourhood: {neighbourhood}\n\
         Past No-Shows: {past}\n\
         \n\
         Based on this data, predict the probability (0 to 1) that the patient will not show up \
         for the appointment, and label it \"no-show\" or \"attend\". Identify exactly the top 3 \
         factors influencing the prediction, ranked by importance, each with a signed numeric \
         contribution (positive pushes toward no-show, negative toward attend). Suggest a \
         recommended action such as sending an SMS reminder or making a phone call, and write a \
         short human-readable explanation as HTML.\n\
         \n\
         Respond with strict JSON of exactly this shape:\n\
         {{\"probability\": number, \"label\": \"no-show\" | \"attend\", \
         \"top_features\": [{{\"name\": string, \"contribution\": number}}], \
         \"recommended_action\": string, \"explanation_html\": string}}",
        patient_id = payload.patient_id.as_deref().unwrap_or(""),
        age = payload.age,
        gender = payload.gender,
        scheduled = payload.scheduled_iso,
        appointment = payload.appointment_iso,
        sms = payload.sms_received,
        comorb = payload.comorb_count,
        neighbourhood = payload.neighbourhood,
        past = payload.past_no_shows.map(|n| n.to_string()).unwrap_or_default(),
    )
}

/// Slice the outermost JSON object out of a model reply.
///
/// Models often wrap the object in a fenced code block or a sentence.
pub fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}
