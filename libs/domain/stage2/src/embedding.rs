use async_trait::async_trait;
use jobscout_domain_models::{JobRecord, Profile};

use crate::{Stage2Analyzer, Stage2Error, Stage2Outcome};

/// Embedding-similarity semantic scoring against an external vector
/// service. Same boundary as [`crate::llm::LlmAnalyzer`]: the interface is
/// real, the backend is an external collaborator not covered by this core.
pub struct EmbeddingAnalyzer {
    index_name: String,
}

impl EmbeddingAnalyzer {
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
        }
    }
}

#[async_trait]
impl Stage2Analyzer for EmbeddingAnalyzer {
    fn name(&self) -> &'static str {
        "embedding"
    }

    async fn analyze(&self, _record: &JobRecord, _profile: &Profile) -> Result<Stage2Outcome, Stage2Error> {
        Err(Stage2Error::Transient(format!(
            "no embedding index wired for {}",
            self.index_name
        )))
    }
}
