//! NoShow Sentinel core library
//!
//! Validation, prediction backends, session state and the HTTP API behind
//! the no-show risk dashboard.

pub mod api;
pub mod core;
pub mod error;
pub mod models;
pub mod session;

/// Application configuration
pub mod config {
    use std::sync::Arc;
    use std::time::Duration;
    use serde::Deserialize;
    use url::Url;

    use crate::core::ai::{ChatCompletionModel, PromptPredictor};
    use crate::core::http::HttpPredictor;
    use crate::core::predictor::Predictor;
    use crate::core::stub::StubPredictor;

    #[derive(Debug, Clone, Deserialize)]
    pub struct Config {
        pub server: ServerConfig,
        pub predictor: PredictorConfig,
        pub session: SessionConfig,
        pub display: DisplayConfig,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ServerConfig {
        pub host: String,
        pub port: u16,
        pub cors_origin: Option<String>,
        pub json_logs: bool,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Backend {
        Http,
        Prompt,
        Stub,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct PredictorConfig {
        pub backend: Backend,
        /// Prediction service endpoint for the `http` backend.
        pub endpoint: String,
        /// Chat completions endpoint for the `prompt` backend.
        pub model_url: String,
        pub model: String,
        pub api_key: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct SessionConfig {
        pub history_capacity: usize,
        pub simulation_debounce_ms: u64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct DisplayConfig {
        /// Percent; only flags views, never relabels predictions.
        pub risk_threshold: u8,
        pub auto_reminders: bool,
    }

    impl SessionConfig {
        pub fn simulation_debounce(&self) -> Duration {
            Duration::from_millis(self.simulation_debounce_ms)
        }
    }

    impl PredictorConfig {
        /// Build the configured predictor backend.
        pub fn build(&self) -> Result<Arc<dyn Predictor>, config::ConfigError> {
            let predictor: Arc<dyn Predictor> = match self.backend {
                Backend::Http => Arc::new(HttpPredictor::new(parse_url("predictor.endpoint", &self.endpoint)?)),
                Backend::Prompt => {
                    let api_key = self.api_key.clone().ok_or_else(|| {
                        config::ConfigError::Message("predictor.api_key is required for the prompt backend".into())
                    })?;
                    let model = ChatCompletionModel::new(
                        parse_url("predictor.model_url", &self.model_url)?,
                        self.model.clone(),
                        api_key,
                    );
                    Arc::new(PromptPredictor::new(model))
                }
                Backend::Stub => Arc::new(StubPredictor::default()),
            };
            Ok(predictor)
        }
    }

    fn parse_url(key: &str, value: &str) -> Result<Url, config::ConfigError> {
        Url::parse(value).map_err(|e| config::ConfigError::Message(format!("{}: invalid URL {:?}: {}", key, value, e)))
    }

    /// Load configuration from file
    pub fn load_config() -> Result<Config, config::ConfigError> {
        let env = std::env::var("SENTINEL_ENV").unwrap_or_else(|_| "development".into());

        config::Config::builder()
            // Start with default settings
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.json_logs", false)?
            .set_default("predictor.backend", "http")?
            .set_default("predictor.endpoint", "http://localhost:3000/api/predict")?
            .set_default("predictor.model_url", "https://api.openai.com/v1/chat/completions")?
            .set_default("predictor.model", "gpt-4o-mini")?
            .set_default("session.history_capacity", 5)?
            .set_default("session.simulation_debounce_ms", 500)?
            .set_default("display.risk_threshold", 50)?
            .set_default("display.auto_reminders", true)?
            .add_source(config::File::with_name("config/default").required(false))
            // Override with environment-specific settings
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            // Override with environment variables, e.g. SENTINEL_PREDICTOR__BACKEND=stub
            .add_source(
                config::Environment::with_prefix("SENTINEL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn defaults_load_without_files() {
            let config = load_config().unwrap();
            assert_eq!(config.session.history_capacity, 5);
            assert_eq!(config.session.simulation_debounce(), Duration::from_millis(500));
            assert_eq!(config.display.risk_threshold, 50);
            assert!(config.display.auto_reminders);
        }

        fn predictor(backend: Backend) -> PredictorConfig {
            PredictorConfig {
                backend,
                endpoint: "http://localhost:3000/api/predict".into(),
                model_url: "https://models.example/v1/chat/completions".into(),
                model: "test-model".into(),
                api_key: None,
            }
        }

        #[test]
        fn builds_each_backend() {
            assert_eq!(predictor(Backend::Stub).build().unwrap().name(), "stub");
            assert_eq!(predictor(Backend::Http).build().unwrap().name(), "http");

            let mut prompt = predictor(Backend::Prompt);
            prompt.api_key = Some("secret".into());
            assert_eq!(prompt.build().unwrap().name(), "prompt");
        }

        #[test]
        fn prompt_backend_needs_api_key() {
            assert!(predictor(Backend::Prompt).build().is_err());
        }

        #[test]
        fn bad_endpoint_is_rejected() {
            let mut http = predictor(Backend::Http);
            http.endpoint = "not a url".into();
            assert!(http.build().is_err());
        }
    }
}
