use async_trait::async_trait;
use jobscout_domain_models::{JobRecord, Profile};

use crate::{Stage2Analyzer, Stage2Error, Stage2Outcome};

/// LLM-backed semantic scoring. The optional LLM content-extractor is an
/// external collaborator per spec.md §1 — this wiring exists so the
/// Processor can be pointed at one, but the model call itself is not part
/// of this core. Every call surfaces `Stage2Error::Transient`, which the
/// Processor treats as "Stage2 skipped" rather than a run failure.
pub struct LlmAnalyzer {
    model_endpoint: String,
}

impl LlmAnalyzer {
    pub fn new(model_endpoint: impl Into<String>) -> Self {
        Self {
            model_endpoint: model_endpoint.into(),
        }
    }
}

#[async_trait]
impl Stage2Analyzer for LlmAnalyzer {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn analyze(&self, _record: &JobRecord, _profile: &Profile) -> Result<Stage2Outcome, Stage2Error> {
        Err(Stage2Error::Transient(format!(
            "no LLM backend wired at {}",
            self.model_endpoint
        )))
    }
}
