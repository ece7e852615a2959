use async_trait::async_trait;

use crate::error::PredictionError;
use crate::models::prediction::PredictionResult;
use crate::models::request::PredictionRequest;

/// An external no-show predictor.
///
/// Every call is a full round trip; implementations do not cache results or
/// retry on failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, PredictionError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
