//! Slow, semantic per-job evaluation (§4.H). Three variants hide behind
//! one trait: `Heuristic` (implemented in full — keyword-overlap scoring,
//! runnable with no external services), and `Llm`/`Embedding` (the wiring
//! exists; their model calls are out of scope per spec.md §1, so they
//! return `Stage2Error::Transient` until a real backend is plugged in).

pub mod cache;
pub mod embedding;
pub mod error;
pub mod heuristic;
pub mod llm;

use async_trait::async_trait;
use jobscout_domain_models::{JobRecord, Profile};

pub use error::Stage2Error;

/// Result of a semantic evaluation (§4.H contract).
#[derive(Debug, Clone, PartialEq)]
pub struct Stage2Outcome {
    pub semantic_score: f64,
    pub rationale: String,
    pub extracted_skills: Vec<String>,
    pub requirements: Vec<String>,
}

/// Implemented by every Stage2 backend. Must be re-entrant: safe to call
/// concurrently at whatever degree the Processor configures.
#[async_trait]
pub trait Stage2Analyzer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn analyze(&self, record: &JobRecord, profile: &Profile) -> Result<Stage2Outcome, Stage2Error>;
}

pub use cache::CachingAnalyzer;
pub use embedding::EmbeddingAnalyzer;
pub use heuristic::HeuristicAnalyzer;
pub use llm::LlmAnalyzer;
