use std::collections::{HashMap, HashSet};

/// Result of one `Scraper::scrape` invocation. Every field is a count, so
/// the CLI's one-line Summary (§7: "commands print a one-line Summary
/// with counters per category") is just `Debug`-formatting this struct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub records_seen: u64,
    pub records_inserted: u64,
    pub records_updated: u64,
    pub records_unchanged: u64,
    pub records_dropped: u64,
    pub resolve_timeouts: u64,
    /// Sites where every search triple reported `AdapterDrift` (zero
    /// cards on what should be a non-empty page). Drives the CLI's exit
    /// code 4 (§6: "core drift detected").
    pub sites_with_drift: HashSet<String>,
    pub sites_attempted: HashSet<String>,
    pub cancelled: bool,
    pub extra_counters: HashMap<String, i64>,
}

impl ScrapeSummary {
    /// §6: exit non-zero when zero records were inserted and at least one
    /// site reported drift.
    pub fn is_total_drift(&self) -> bool {
        !self.sites_attempted.is_empty() && self.sites_with_drift == self.sites_attempted
    }

    /// §8: "records_inserted + records_updated + records_unchanged ==
    /// records_seen" — no silent drops beyond the ones explicitly counted.
    pub fn accounts_for_every_record(&self) -> bool {
        self.records_inserted + self.records_updated + self.records_unchanged + self.records_dropped
            == self.records_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_drift_requires_every_attempted_site_to_drift() {
        let mut summary = ScrapeSummary::default();
        summary.sites_attempted.insert("eluta".to_string());
        summary.sites_attempted.insert("indeed".to_string());
        summary.sites_with_drift.insert("eluta".to_string());
        assert!(!summary.is_total_drift());
        summary.sites_with_drift.insert("indeed".to_string());
        assert!(summary.is_total_drift());
    }

    #[test]
    fn accounting_identity_holds_for_a_balanced_run() {
        let summary = ScrapeSummary {
            records_seen: 10,
            records_inserted: 4,
            records_updated: 3,
            records_unchanged: 2,
            records_dropped: 1,
            ..Default::default()
        };
        assert!(summary.accounts_for_every_record());
    }
}
