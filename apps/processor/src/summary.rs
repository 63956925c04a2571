/// Result of one `Processor::process` invocation (§7: one-line Summary).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessSummary {
    pub stage1_evaluated: u64,
    pub stage1_passed_gate: u64,
    pub stage1_dropped: u64,
    pub stage2_attempted: u64,
    pub stage2_succeeded: u64,
    pub stage2_errors: u64,
    pub finalized: u64,
    pub cancelled: bool,
}

impl ProcessSummary {
    /// §8 Stage2-outage scenario: every Stage2 call this run failed, but
    /// Stage1 results are still durably recorded. Drives the CLI's
    /// "partial success" exit path rather than a hard failure.
    pub fn is_stage2_outage(&self) -> bool {
        self.stage2_attempted > 0 && self.stage2_succeeded == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage2_outage_requires_at_least_one_attempt() {
        let summary = ProcessSummary::default();
        assert!(!summary.is_stage2_outage());
    }

    #[test]
    fn stage2_outage_detected_when_every_attempt_fails() {
        let summary = ProcessSummary {
            stage2_attempted: 3,
            stage2_errors: 3,
            stage2_succeeded: 0,
            ..Default::default()
        };
        assert!(summary.is_stage2_outage());
    }
}
