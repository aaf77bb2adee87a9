// CV intake: PDF text extraction and skill profiling.
// Skill profiling goes through llm_client and degrades to a keyword scan.

pub mod handlers;
pub mod pdf;
pub mod prompts;
pub mod skills;
