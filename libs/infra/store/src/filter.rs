use chrono::{DateTime, Utc};
use jobscout_domain_models::Status;

/// Filter applied by [`crate::Store::query`]. Every field is optional;
/// an empty filter returns every record for the profile.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub statuses: Vec<Status>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub source_site: Option<String>,
    pub search_keyword: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

impl JobFilter {
    pub fn with_status(mut self, status: Status) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.source_site = Some(site.into());
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.search_keyword = Some(keyword.into());
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}
