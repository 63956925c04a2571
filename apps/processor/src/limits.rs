/// Tunables for one `Processor::process` invocation (§4.G/§4.H).
#[derive(Debug, Clone)]
pub struct ProcessLimits {
    /// Rayon thread-pool width for the Stage1 fan-out. `None` lets rayon
    /// pick (its default: one thread per logical core).
    pub cpu_workers: Option<usize>,
    /// Bounded concurrency for the Stage2 fan-out (§4.H: "re-entrant,
    /// safe to call concurrently at whatever degree the Processor
    /// configures").
    pub stage2_concurrency: usize,
    /// Cap on how many `Scraped` records one invocation pulls off the
    /// Store; `None` processes everything currently eligible.
    pub max_records: Option<usize>,
    pub stage1_threshold: f64,
    /// `(stage1_weight, stage2_weight)` blended into `final_score` (§4.H).
    pub final_score_weights: (f64, f64),
    /// When `false`, `process` stops after writing Stage1 scores back and
    /// never fans gate-passing records into Stage2 — the CLI's
    /// stage1-only selector (§6) uses this rather than driving Stage2 at
    /// zero concurrency, which would simply block forever.
    pub run_stage2: bool,
}

impl Default for ProcessLimits {
    fn default() -> Self {
        Self {
            cpu_workers: None,
            stage2_concurrency: 4,
            max_records: None,
            stage1_threshold: jobscout_domain_stage1::DEFAULT_THRESHOLD,
            final_score_weights: (0.4, 0.6),
            run_stage2: true,
        }
    }
}
