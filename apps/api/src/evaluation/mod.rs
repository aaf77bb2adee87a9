// Answer evaluation: pre-checks, LLM scoring, score extraction, fallback, batch summary.
// All model calls go through llm_client::InferenceBackend.

pub mod evaluator;
pub mod extractor;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod precheck;
pub mod prompts;
pub mod summary;
pub mod text;

pub use evaluator::Evaluator;
pub use policy::{CodePenalty, EvaluationPolicy};
