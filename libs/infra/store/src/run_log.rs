//! Append-only run log: one row per Scraper or Processor invocation, with
//! start/end times and a JSON blob of counters (§6 persisted state
//! layout). Counters are whatever the caller wants recorded — records
//! inserted, AdapterDrift hits, stage2_skipped, and so on — the store
//! does not interpret them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Scrape,
    Process,
}

impl RunKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunKind::Scrape => "scrape",
            RunKind::Process => "process",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scrape" => Some(RunKind::Scrape),
            "process" => Some(RunKind::Process),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub id: i64,
    pub kind: RunKind,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub counters: HashMap<String, i64>,
}
