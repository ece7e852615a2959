//! Data models for prediction requests, results and history entries.

pub mod prediction;
pub mod request;

pub use prediction::{AuditLogEntry, Contribution, FeatureContribution, Label, PredictionResult};
pub use request::{Gender, PredictionPayload, PredictionRequest, RawForm};
