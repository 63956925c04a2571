//! The browser-facing half of one worker's triple: fetching a search
//! page's rendered HTML and resolving a card's link to a canonical URL.
//! Pulled out behind a trait so [`crate::worker::process_triple`] is
//! testable against a canned fixture instead of a live Chromium instance.

use async_trait::async_trait;
use chromiumoxide::page::Page;

use jobscout_domain_adapters::JobCard;
use jobscout_infra_browser::Lease;
use jobscout_infra_resolver::{ResolveOutcome, UrlResolver};

use crate::error::ScraperError;

#[async_trait]
pub trait ListingBrowser: Send + Sync {
    /// Navigate to `url` and return the rendered document HTML.
    async fn fetch_page(&self, url: &str) -> Result<String, ScraperError>;

    /// Resolve one card's link to a canonical employer URL (§4.C).
    async fn resolve_card(&self, card: &JobCard, listing_url: &str) -> Result<ResolveOutcome, ScraperError>;
}

/// Production implementation: one `BrowserPool` lease driving both page
/// fetches and card resolution for every page of a single `WorkItem`
/// triple, so the worker never holds more than the one lease §4.F calls
/// for.
pub struct BrowserListingBrowser<'a> {
    lease: &'a Lease,
    resolver: &'a UrlResolver,
}

impl<'a> BrowserListingBrowser<'a> {
    pub fn new(lease: &'a Lease, resolver: &'a UrlResolver) -> Self {
        Self { lease, resolver }
    }

    async fn page(&self) -> &Page {
        self.lease.page()
    }
}

#[async_trait]
impl<'a> ListingBrowser for BrowserListingBrowser<'a> {
    async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        let page = self.page().await;
        page.goto(url)
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        page.content()
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))
    }

    async fn resolve_card(&self, card: &JobCard, listing_url: &str) -> Result<ResolveOutcome, ScraperError> {
        let page = self.page().await;
        let selector = card_link_selector(card);
        self.resolver
            .resolve(card.href.as_deref(), listing_url, self.lease, page, &selector)
            .await
            .map_err(ScraperError::from)
    }
}

/// Best-effort CSS selector identifying this card's link in the live DOM
/// for the click-and-capture step (§4.C step 3). Exact-matches the
/// card's `href` attribute when one was read off the static document;
/// falls back to a generic anchor selector for hrefless cards (e.g. a
/// `javascript:void(0)` popup trigger), which may match more than one
/// element on a listing page with several such cards — `find_element`
/// takes the first, so a page with multiple indistinguishable popup
/// triggers can click the wrong one. Threading a DOM index or unique
/// attribute through `JobCard` would remove the ambiguity; tracked as
/// follow-up, not blocking for sites whose cards carry real hrefs.
fn card_link_selector(card: &JobCard) -> String {
    match card.href.as_deref().filter(|h| !h.trim().is_empty()) {
        Some(href) => format!("a[href={:?}]", href),
        None => "a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_quotes_the_href_value() {
        let card = JobCard {
            fragment_html: String::new(),
            href: Some("/redirect?url=https://acme.com".to_string()),
        };
        assert_eq!(
            card_link_selector(&card),
            r#"a[href="/redirect?url=https://acme.com"]"#
        );
    }

    #[test]
    fn hrefless_card_falls_back_to_generic_anchor() {
        let card = JobCard {
            fragment_html: String::new(),
            href: None,
        };
        assert_eq!(card_link_selector(&card), "a");
    }
}
