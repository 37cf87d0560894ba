pub mod dedup;
mod orchestrator;
mod pipeline;
pub mod scorer;

pub use dedup::{NearDuplicateFilter, SimilarityMatrix, DEFAULT_SIMILARITY_THRESHOLD};
pub use orchestrator::{ArticleSummarizer, SummarizationOrchestrator, DEFAULT_MAX_ARTICLES};
pub use pipeline::{CategoryReport, CurationPipeline, CycleReport};
pub use scorer::{RelevanceScorer, URGENCY_KEYWORDS};

#[cfg(test)]
pub(crate) use pipeline::tests as pipeline_tests;
