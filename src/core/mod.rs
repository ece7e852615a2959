//! Prediction core: validation, predictor backends and history.

pub mod ai;
pub mod audit;
pub mod data;
pub mod http;
pub mod predictor;
pub mod response;
pub mod stub;
pub mod view;

pub use predictor::Predictor;
