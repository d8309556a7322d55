pub mod answer;
pub mod ingest;
#[cfg(test)]
pub(crate) mod testing;

pub use answer::{AnswerPipeline, SYSTEM_PROMPT};
pub use ingest::{IngestPipeline, IngestReport};
