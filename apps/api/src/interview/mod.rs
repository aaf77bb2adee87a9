// Interview preparation: exercise generation from knowledge excerpts and
// reference answers for generated questions.

pub mod generator;
pub mod handlers;
pub mod prompts;
