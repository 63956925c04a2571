//! Scraping Core entry point (§4): builds the deterministic
//! `(site, keyword, location)` work queue, drives it through every
//! registered [`jobscout_domain_adapters::SiteAdapter`] over a bounded
//! [`jobscout_infra_browser::BrowserPool`], and upserts resolved postings
//! into the [`jobscout_infra_store::Store`].

pub mod error;
pub mod limits;
pub mod listing_browser;
pub mod queue;
pub mod scraper;
pub mod summary;
pub mod worker;

pub use error::ScraperError;
pub use limits::ScrapeLimits;
pub use queue::{build_queue, WorkItem};
pub use scraper::Scraper;
pub use summary::ScrapeSummary;
