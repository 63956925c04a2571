use std::sync::Arc;

use jobscout_app_processor::{ProcessLimits, ProcessSummary, Processor};
use jobscout_domain_models::Profile;
use jobscout_domain_stage2::{CachingAnalyzer, HeuristicAnalyzer, Stage2Analyzer};
use jobscout_infra_store::{RunKind, Store};
use jobscout_shared_context::RunContext;
use tracing::{info, instrument};

use crate::args::{Stage2Backend, StageArg};
use crate::error::CliError;
use crate::paths::ProfilePaths;

#[instrument(skip(profile, paths))]
pub async fn run(
    profile: Profile,
    paths: &ProfilePaths,
    stage: StageArg,
    backend: Stage2Backend,
    mut limits: ProcessLimits,
) -> Result<ProcessSummary, CliError> {
    let store = Arc::new(Store::open(&paths.store_db)?);
    let ctx = RunContext::new(store.clone());
    let run_id = store.start_run(RunKind::Process)?;

    if stage == StageArg::Stage1 {
        limits.run_stage2 = false;
    }

    let stage2: Arc<dyn Stage2Analyzer> = build_analyzer(backend);
    let processor = Processor::new(stage2, limits);

    info!(stage = ?stage, "starting process run");
    let summary = if stage == StageArg::Stage2 {
        processor.process_stage2_only(&profile, &ctx).await
    } else {
        processor.process(&profile, &ctx).await
    };

    store.finish_run(run_id, &ctx.counters().snapshot())?;
    Ok(summary)
}

fn build_analyzer(backend: Stage2Backend) -> Arc<dyn Stage2Analyzer> {
    match backend {
        Stage2Backend::Heuristic => Arc::new(CachingAnalyzer::new(HeuristicAnalyzer::default())),
        Stage2Backend::Llm => Arc::new(CachingAnalyzer::new(jobscout_domain_stage2::LlmAnalyzer::new(
            "unconfigured",
        ))),
        Stage2Backend::Embedding => Arc::new(CachingAnalyzer::new(
            jobscout_domain_stage2::EmbeddingAnalyzer::new("unconfigured"),
        )),
    }
}
