use std::sync::Arc;

use jobscout_app_scraper::{ScrapeLimits, ScrapeSummary, Scraper};
use jobscout_domain_models::Profile;
use jobscout_infra_browser::{BrowserPool, PoolConfig};
use jobscout_infra_resolver::UrlResolver;
use jobscout_infra_store::{RunKind, Store};
use jobscout_shared_context::RunContext;
use tracing::{info, instrument};

use crate::args::SiteArg;
use crate::error::CliError;
use crate::paths::ProfilePaths;

#[instrument(skip(profile, paths))]
pub async fn run(
    profile: Profile,
    paths: &ProfilePaths,
    sites: &[SiteArg],
    limits: ScrapeLimits,
) -> Result<ScrapeSummary, CliError> {
    let store = Arc::new(Store::open(&paths.store_db)?);
    let ctx = RunContext::new(store.clone());
    let run_id = store.start_run(RunKind::Scrape)?;

    let site_ids: Vec<&'static str> = if sites.is_empty() {
        jobscout_domain_adapters::all_adapters()
            .iter()
            .map(|a| a.site_id())
            .collect()
    } else {
        sites.iter().map(|s| s.site_id()).collect()
    };

    let browser_pool = Arc::new(BrowserPool::new(PoolConfig {
        pool_size: limits.max_concurrent_workers.max(1).min(4),
        ..PoolConfig::default()
    }));
    let resolver = Arc::new(UrlResolver::default());
    let scraper = Scraper::new(browser_pool, resolver, limits);

    info!(sites = ?site_ids, "starting scrape run");
    let summary = scraper.scrape(&profile, &site_ids, &ctx).await;

    store.finish_run(run_id, &ctx.counters().snapshot())?;
    Ok(summary)
}
