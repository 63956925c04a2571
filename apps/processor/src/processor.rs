//! Two-Stage Processing Core entry point (§4.G/§4.H): a CPU-bound Stage1
//! fan-out over `rayon` gates a bounded-concurrency Stage2 pass, with
//! every write-back going through the Store's CAS status transitions so
//! a crash mid-run leaves every touched record in a consistent,
//! resumable state.

use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{instrument, warn};

use jobscout_domain_models::{JobRecord, Profile, Status};
use jobscout_domain_stage1::{self as stage1, Stage1Outcome};
use jobscout_domain_stage2::Stage2Analyzer;
use jobscout_infra_store::{JobFilter, ScoreUpdate};
use jobscout_shared_context::RunContext;

use crate::limits::ProcessLimits;
use crate::summary::ProcessSummary;

pub struct Processor {
    stage2: Arc<dyn Stage2Analyzer>,
    limits: ProcessLimits,
}

impl Processor {
    pub fn new(stage2: Arc<dyn Stage2Analyzer>, limits: ProcessLimits) -> Self {
        Self { stage2, limits }
    }

    #[instrument(skip(self, profile, ctx))]
    pub async fn process(&self, profile: &Profile, ctx: &RunContext) -> ProcessSummary {
        let mut summary = ProcessSummary::default();
        if ctx.should_stop() {
            summary.cancelled = true;
            return summary;
        }

        let scored_fingerprints = match self.load_scored_fingerprints(ctx) {
            Ok(set) => set,
            Err(e) => {
                ctx.counters().bump("processor_query_failed");
                warn!(error = %e, "failed to load already-scored fingerprints");
                return summary;
            }
        };

        let mut filter = JobFilter::default().with_status(Status::Scraped);
        if let Some(max) = self.limits.max_records {
            filter = filter.limit(max as u32);
        }
        let candidates = match ctx.store().query(&filter) {
            Ok(records) => records,
            Err(e) => {
                ctx.counters().bump("processor_query_failed");
                warn!(error = %e, "failed to query scraped records");
                return summary;
            }
        };

        let eligible = self.run_stage1(candidates, profile, &scored_fingerprints, ctx, &mut summary);

        if ctx.should_stop() {
            summary.cancelled = true;
            return summary;
        }

        if !self.limits.run_stage2 {
            return summary;
        }

        self.run_stage2(eligible, profile, ctx, &mut summary).await;
        summary
    }

    /// Stage2-only entry point (the CLI's stage2-only selector, §6):
    /// skips Stage1 entirely and fans records already sitting at
    /// `stage1_scored` straight into the Stage2 pass, reusing their
    /// persisted `stage1_score` for the blended `final_score`.
    #[instrument(skip(self, profile, ctx))]
    pub async fn process_stage2_only(&self, profile: &Profile, ctx: &RunContext) -> ProcessSummary {
        let mut summary = ProcessSummary::default();
        if ctx.should_stop() {
            summary.cancelled = true;
            return summary;
        }

        let mut filter = JobFilter::default().with_status(Status::Stage1Scored);
        if let Some(max) = self.limits.max_records {
            filter = filter.limit(max as u32);
        }
        let candidates = match ctx.store().query(&filter) {
            Ok(records) => records,
            Err(e) => {
                ctx.counters().bump("processor_query_failed");
                warn!(error = %e, "failed to query stage1_scored records");
                return summary;
            }
        };

        let eligible: Vec<(JobRecord, Stage1Outcome)> = candidates
            .into_iter()
            .map(|record| {
                let outcome = Stage1Outcome {
                    score: record.stage1_score.unwrap_or(0.0),
                    reasons: record.stage1_reasons.clone(),
                    passes_gate: true,
                    seniority: jobscout_domain_stage1::Seniority::Mid,
                };
                (record, outcome)
            })
            .collect();

        self.run_stage2(eligible, profile, ctx, &mut summary).await;
        summary
    }

    /// Fingerprints already at or beyond `stage1_scored`, so a record
    /// scraped again under a different keyword this run doesn't get
    /// scored twice (§4.G: "duplicate fingerprint already scored").
    fn load_scored_fingerprints(&self, ctx: &RunContext) -> Result<HashSet<String>, jobscout_infra_store::StoreError> {
        let filter = JobFilter::default()
            .with_status(Status::Stage1Scored)
            .with_status(Status::Processed);
        let records = ctx.store().query(&filter)?;
        Ok(records.into_iter().map(|r| r.fingerprint).collect())
    }

    /// CPU-bound fan-out (§4.G): every candidate is scored independently
    /// and in parallel via rayon, then every outcome is written back
    /// through the Store's `Scraped -> Stage1Scored` CAS one at a time —
    /// the scoring is parallel, the persistence is not, since SQLite
    /// writes serialize through the pool's single writer anyway.
    fn run_stage1(
        &self,
        candidates: Vec<JobRecord>,
        profile: &Profile,
        scored_fingerprints: &HashSet<String>,
        ctx: &RunContext,
        summary: &mut ProcessSummary,
    ) -> Vec<(JobRecord, Stage1Outcome)> {
        let threshold = self.limits.stage1_threshold;
        let scored: Vec<(JobRecord, Stage1Outcome)> = candidates
            .into_par_iter()
            .map(|record| {
                let outcome = stage1::evaluate_with_threshold(&record, profile, scored_fingerprints, threshold);
                (record, outcome)
            })
            .collect();

        for (record, outcome) in &scored {
            summary.stage1_evaluated += 1;
            if outcome.passes_gate {
                summary.stage1_passed_gate += 1;
            } else {
                summary.stage1_dropped += 1;
            }

            let update = ScoreUpdate {
                stage1_score: Some(outcome.score),
                stage1_reasons: Some(outcome.reasons.clone()),
                ..Default::default()
            };
            if let Err(e) = ctx
                .store()
                .update_scores(&record.fingerprint, Status::Scraped, Status::Stage1Scored, update)
            {
                ctx.counters().bump("processor_stage1_write_failed");
                warn!(fingerprint = %record.fingerprint, error = %e, "stage1 write-back failed");
            }
        }

        scored.into_iter().filter(|(_, outcome)| outcome.passes_gate).collect()
    }

    /// Bounded-concurrency Stage2 fan-out (§4.H), gated on the Stage1
    /// pass just computed. A Stage2 call that errors leaves its record
    /// at `stage1_scored` rather than advancing it — the spec's
    /// Stage2-outage scenario (§8) depends on this: Stage1 results
    /// persist even when every Stage2 call fails.
    async fn run_stage2(
        &self,
        eligible: Vec<(JobRecord, Stage1Outcome)>,
        profile: &Profile,
        ctx: &RunContext,
        summary: &mut ProcessSummary,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.limits.stage2_concurrency.max(1)));
        let mut join_set = JoinSet::new();
        let (stage1_weight, stage2_weight) = self.limits.final_score_weights;

        for (record, outcome) in eligible {
            if ctx.should_stop() {
                summary.cancelled = true;
                break;
            }

            let semaphore = semaphore.clone();
            let stage2 = self.stage2.clone();
            let profile = profile.clone();
            let ctx = ctx.clone();
            let stage1_score = outcome.score;

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                match stage2.analyze(&record, &profile).await {
                    Ok(result) => {
                        let final_score = stage1_weight * stage1_score + stage2_weight * result.semantic_score;
                        let update = ScoreUpdate {
                            stage2_score: Some(result.semantic_score),
                            final_score: Some(final_score),
                            extracted_skills: Some(result.extracted_skills),
                            requirements: Some(result.requirements),
                            ..Default::default()
                        };
                        match ctx.store().update_scores(
                            &record.fingerprint,
                            Status::Stage1Scored,
                            Status::Processed,
                            update,
                        ) {
                            Ok(()) => Stage2TaskResult::Finalized,
                            Err(e) => {
                                warn!(fingerprint = %record.fingerprint, error = %e, "stage2 write-back failed");
                                Stage2TaskResult::WriteFailed
                            }
                        }
                    }
                    Err(e) => {
                        warn!(fingerprint = %record.fingerprint, analyzer = stage2.name(), error = %e, "stage2 analysis failed");
                        Stage2TaskResult::AnalysisFailed
                    }
                }
            });
        }

        while let Some(joined) = join_set.join_next().await {
            summary.stage2_attempted += 1;
            match joined {
                Ok(Stage2TaskResult::Finalized) => {
                    summary.stage2_succeeded += 1;
                    summary.finalized += 1;
                }
                Ok(Stage2TaskResult::WriteFailed) => {
                    ctx.counters().bump("processor_stage2_write_failed");
                    summary.stage2_errors += 1;
                }
                Ok(Stage2TaskResult::AnalysisFailed) => {
                    ctx.counters().bump("processor_stage2_failed");
                    summary.stage2_errors += 1;
                }
                Err(e) => {
                    ctx.counters().bump("processor_worker_panicked");
                    warn!(error = %e, "stage2 worker task panicked");
                    summary.stage2_errors += 1;
                }
            }
        }
    }
}

enum Stage2TaskResult {
    Finalized,
    WriteFailed,
    AnalysisFailed,
}
