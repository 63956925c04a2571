//! Top-level entry point (§4.F): build the deterministic work queue, fan
//! it out across a bounded pool of workers sharing one [`BrowserPool`],
//! and fold every triple's [`crate::worker::TripleOutcome`] into one
//! [`ScrapeSummary`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, instrument};

use jobscout_domain_adapters::by_site_id;
use jobscout_domain_models::Profile;
use jobscout_infra_browser::BrowserPool;
use jobscout_infra_resolver::UrlResolver;
use jobscout_shared_context::RunContext;

use crate::limits::ScrapeLimits;
use crate::listing_browser::BrowserListingBrowser;
use crate::queue::{build_queue, WorkItem};
use crate::summary::ScrapeSummary;
use crate::worker::{new_seen_map, process_triple, SeenMap};

/// Drives the Scraping Core: one instance per invocation, holding the
/// shared `BrowserPool`/`UrlResolver` every worker leases from.
pub struct Scraper {
    browser_pool: Arc<BrowserPool>,
    resolver: Arc<UrlResolver>,
    limits: ScrapeLimits,
}

impl Scraper {
    pub fn new(browser_pool: Arc<BrowserPool>, resolver: Arc<UrlResolver>, limits: ScrapeLimits) -> Self {
        Self {
            browser_pool,
            resolver,
            limits,
        }
    }

    /// Run every `(site, keyword, location)` triple implied by `profile`
    /// and `site_ids`, bounded to `limits.max_concurrent_workers`
    /// concurrent triples, and fold the results into one summary.
    #[instrument(skip(self, profile, ctx))]
    pub async fn scrape(&self, profile: &Profile, site_ids: &[&'static str], ctx: &RunContext) -> ScrapeSummary {
        let queue = build_queue(profile, site_ids);
        info!(queue_len = queue.len(), "built scrape work queue");

        let seen: Arc<SeenMap> = Arc::new(new_seen_map());
        let mut summary = ScrapeSummary::default();
        // Per-site evidence: did any triple for this site see cards, and
        // did any triple for this site report drift. A site counts as
        // "total drift" only if it never once produced cards (§8).
        let mut site_had_cards: HashMap<&'static str, bool> = HashMap::new();
        let mut site_had_drift: HashMap<&'static str, bool> = HashMap::new();

        let mut join_set = JoinSet::new();
        let mut pending = queue.into_iter();
        let max_in_flight = self.limits.max_concurrent_workers.max(1);

        // Prime up to `max_in_flight` triples, then replace each as it
        // completes, so at most `max_in_flight` browser leases are held
        // concurrently regardless of queue length.
        for item in pending.by_ref().take(max_in_flight) {
            self.spawn_triple(&mut join_set, item, seen.clone(), ctx.clone());
        }

        while let Some(joined) = join_set.join_next().await {
            let (site_id, outcome) = match joined {
                Ok(result) => result,
                Err(e) => {
                    ctx.counters().bump("scrape_worker_panicked");
                    tracing::warn!(error = %e, "scrape worker task panicked");
                    continue;
                }
            };

            summary.sites_attempted.insert(site_id.to_string());
            summary.records_seen += outcome.records_seen;
            summary.records_inserted += outcome.records_inserted;
            summary.records_updated += outcome.records_updated;
            summary.records_unchanged += outcome.records_unchanged;
            summary.records_dropped += outcome.records_dropped;
            summary.resolve_timeouts += outcome.resolve_timeouts;
            summary.cancelled = summary.cancelled || outcome.cancelled;
            *site_had_cards.entry(site_id).or_insert(false) |= outcome.had_cards;
            *site_had_drift.entry(site_id).or_insert(false) |= outcome.had_drift;

            if let Some(item) = pending.next() {
                self.spawn_triple(&mut join_set, item, seen.clone(), ctx.clone());
            }
        }

        for (site_id, had_cards) in &site_had_cards {
            if !had_cards && site_had_drift.get(site_id).copied().unwrap_or(false) {
                summary.sites_with_drift.insert(site_id.to_string());
            }
        }

        summary.extra_counters = ctx.counters().snapshot();
        summary
    }

    fn spawn_triple(
        &self,
        join_set: &mut JoinSet<(&'static str, crate::worker::TripleOutcome)>,
        item: WorkItem,
        seen: Arc<SeenMap>,
        ctx: RunContext,
    ) {
        let browser_pool = self.browser_pool.clone();
        let resolver = self.resolver.clone();
        let limits = self.limits.clone();

        join_set.spawn(async move {
            let site_id = item.site_id;

            let Some(adapter) = by_site_id(item.site_id) else {
                return (site_id, crate::worker::TripleOutcome::default());
            };

            let lease = match browser_pool.acquire().await {
                Ok(lease) => lease,
                Err(e) => {
                    ctx.counters().bump("scrape_lease_acquire_failed");
                    tracing::warn!(site = site_id, error = %e, "failed to acquire browser lease");
                    return (site_id, crate::worker::TripleOutcome::default());
                }
            };

            let browser = BrowserListingBrowser::new(&lease, &resolver);
            let outcome = process_triple(
                adapter.as_ref(),
                &browser,
                &item,
                &limits,
                &ctx,
                &seen,
            )
            .await;
            (site_id, outcome)
        });
    }
}
