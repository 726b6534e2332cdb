//! Resume screening: ingestion, extraction, evaluation and the decision step,
//! tied together by `pipeline::submit_application`.

pub mod decision;
pub mod evaluation;
pub mod extract;
pub mod handlers;
pub mod ingest;
pub mod pipeline;
pub mod prompts;
