use std::time::Duration;

/// Tunables for one `Scraper::scrape` invocation (§4.F).
#[derive(Debug, Clone)]
pub struct ScrapeLimits {
    pub max_pages_per_keyword: u32,
    pub max_jobs_per_keyword: u32,
    pub days_posted_window: Option<u32>,
    pub max_concurrent_workers: usize,
    /// Jittered inter-page delay range, drawn fresh for every page fetch
    /// within a worker (§4.F step 5: "avoid rate-limit tripwires").
    pub page_delay_range: (Duration, Duration),
    pub max_retry_attempts: u32,
}

impl Default for ScrapeLimits {
    fn default() -> Self {
        Self {
            max_pages_per_keyword: 5,
            max_jobs_per_keyword: 50,
            days_posted_window: None,
            max_concurrent_workers: 3,
            page_delay_range: (Duration::from_millis(500), Duration::from_secs(2)),
            max_retry_attempts: 3,
        }
    }
}
