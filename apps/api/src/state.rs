use std::sync::Arc;

use crate::evaluation::Evaluator;
use crate::llm_client::InferenceBackend;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Backend for features that call the model directly (CV skills, questions).
    pub llm: Arc<dyn InferenceBackend>,
    pub evaluator: Arc<Evaluator>,
}

impl AppState {
    pub fn new(llm: Arc<dyn InferenceBackend>, evaluator: Evaluator) -> Self {
        Self {
            llm,
            evaluator: Arc::new(evaluator),
        }
    }
}
