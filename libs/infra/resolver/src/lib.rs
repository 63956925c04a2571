//! Listing-link to canonical employer URL resolution (§4.C). Given a
//! link handle found inside a rendered listing page, `UrlResolver::resolve`
//! yields the URL a human would land on by clicking it — following an
//! absolute external href directly, following a site-internal redirect
//! wrapper with a cheap `reqwest` hop instead of paying for a browser
//! navigation, and falling back to an actual click + popup capture only
//! when neither shortcut applies.

pub mod error;

use std::time::Duration;

use chromiumoxide::page::Page;
use tracing::{debug, instrument, warn};
use url::Url;

pub use error::ResolverError;
use jobscout_infra_browser::Lease;

const SEARCH_PATTERN_MARKERS: &[&str] = &["q=", "pg=", "posted="];
const REDIRECT_WRAPPER_MARKERS: &[&str] = &["/redirect", "/rc/clk", "/out", "/away"];

/// Outcome of one resolution attempt. `canonical_url` is empty on every
/// recoverable failure path (timeout, no popup and no off-domain
/// navigation, closed context) — callers treat empty the same as "could
/// not resolve" rather than matching on `timed_out` unless they care
/// specifically about the timeout counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOutcome {
    pub canonical_url: String,
    pub timed_out: bool,
}

impl ResolveOutcome {
    fn empty() -> Self {
        Self::default()
    }

    fn resolved(url: String) -> Self {
        Self {
            canonical_url: url,
            timed_out: false,
        }
    }
}

pub struct UrlResolver {
    http_client: reqwest::Client,
    click_budget: Duration,
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl UrlResolver {
    /// `click_budget` is the per-click budget bounding step 3 (default 5s
    /// per §4.C).
    pub fn new(click_budget: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client configuration is always valid");
        Self {
            http_client,
            click_budget,
        }
    }

    /// Resolve `href` (as read off a job card by a `SiteAdapter`) to a
    /// canonical employer URL. `listing_base_url` is the URL of the
    /// listing page the card was found on, used to make a relative
    /// `href` absolute and to decide "on the listing site's own domain".
    /// `lease`/`listing_page`/`link_selector` are only consulted for step
    /// 3 (click + popup capture); a `href` that resolves at step 1 or 2
    /// never touches the browser.
    #[instrument(skip(self, lease, listing_page))]
    pub async fn resolve(
        &self,
        href: Option<&str>,
        listing_base_url: &str,
        lease: &Lease,
        listing_page: &Page,
        link_selector: &str,
    ) -> Result<ResolveOutcome, ResolverError> {
        let listing_host = host_of(listing_base_url);

        let Some(raw_href) = href.filter(|h| !h.trim().is_empty()) else {
            return self.click_and_capture(lease, listing_page, link_selector, &listing_host).await;
        };

        if is_listing_self_link(raw_href) {
            return Ok(ResolveOutcome::empty());
        }

        let absolute = absolutize(raw_href, listing_base_url);

        // Step 1: already an absolute external URL.
        if let Some(abs) = &absolute {
            if host_of(abs).as_deref() != Some(listing_host.as_deref().unwrap_or_default())
                && !is_listing_self_link(abs)
            {
                return Ok(ResolveOutcome::resolved(abs.clone()));
            }
        }

        // Step 2: a site-internal redirect wrapper. Follow the hop over
        // HTTP (a cheap HEAD, falling back to a ranged GET) rather than
        // handing the caller an unfollowed wrapper URL.
        if let Some(abs) = &absolute {
            if is_redirect_wrapper(abs) {
                match self.follow_redirect_hop(abs).await {
                    Some(final_url) => return Ok(ResolveOutcome::resolved(final_url)),
                    None => return Ok(ResolveOutcome::resolved(abs.clone())),
                }
            }
        }

        // Step 3: click and observe.
        self.click_and_capture(lease, listing_page, link_selector, &listing_host).await
    }

    async fn follow_redirect_hop(&self, wrapper_url: &str) -> Option<String> {
        if let Ok(response) = self.http_client.head(wrapper_url).send().await {
            let final_url = response.url().to_string();
            if response.status().is_success() || response.status().is_redirection() {
                return Some(final_url);
            }
        }
        // Some endpoints reject HEAD; retry with a byte-ranged GET so we
        // still avoid downloading the full response body.
        let ranged = self
            .http_client
            .get(wrapper_url)
            .header(reqwest::header::RANGE, "bytes=0-0")
            .send()
            .await
            .ok()?;
        Some(ranged.url().to_string())
    }

    /// Step 3: click the link in the automated browser, capture a popup
    /// URL if one opens, and close the popup within one event-loop turn
    /// of capturing its URL. Bounded by `click_budget`; exceeding it
    /// returns empty with `timed_out = true`.
    async fn click_and_capture(
        &self,
        lease: &Lease,
        listing_page: &Page,
        link_selector: &str,
        listing_host: &Option<String>,
    ) -> Result<ResolveOutcome, ResolverError> {
        let baseline_url = listing_page.url().await.ok().flatten();
        let baseline_targets = snapshot_target_ids(lease).await;

        let click_result = tokio::time::timeout(self.click_budget, async {
            let element = listing_page
                .find_element(link_selector)
                .await
                .map_err(|e| e.to_string())?;
            element.click().await.map_err(|e| e.to_string())?;
            // Give the click one tick to either spawn a popup or navigate
            // the current page before we start polling for either.
            tokio::time::sleep(Duration::from_millis(150)).await;

            if let Some(popup) = find_new_page(lease, &baseline_targets).await {
                let popup_url = popup.url().await.ok().flatten().unwrap_or_default();
                let _ = popup.close().await;
                return Ok::<_, String>(Some(popup_url));
            }

            let current_url = listing_page.url().await.ok().flatten();
            if current_url.as_deref() != baseline_url.as_deref() {
                if let Some(url) = &current_url {
                    if host_of(url) != *listing_host {
                        return Ok(Some(url.clone()));
                    }
                }
            }
            Ok(None)
        })
        .await;

        match click_result {
            Ok(Ok(Some(url))) if !is_listing_self_link(&url) => Ok(ResolveOutcome::resolved(url)),
            Ok(Ok(_)) => Ok(ResolveOutcome::empty()),
            Ok(Err(e)) => {
                debug!(error = %e, "click/capture step failed, treating as unresolved");
                Ok(ResolveOutcome::empty())
            }
            Err(_) => {
                warn!("per-click budget exceeded, returning unresolved");
                Ok(ResolveOutcome {
                    canonical_url: String::new(),
                    timed_out: true,
                })
            }
        }
    }
}

/// Snapshot the target IDs of every page currently open on this
/// context, so a later call can spot the one the click added.
async fn snapshot_target_ids(lease: &Lease) -> Vec<String> {
    lease
        .pages()
        .await
        .map(|pages| pages.iter().map(|p| format!("{:?}", p.target_id())).collect())
        .unwrap_or_default()
}

/// Look for a page on the lease's context that wasn't present in
/// `baseline` — the popup the click opened, if any. By elimination
/// rather than by event subscription, since chromiumoxide's page list
/// is cheap to poll and the click window is already bounded.
async fn find_new_page(lease: &Lease, baseline: &[String]) -> Option<Page> {
    let pages = lease.pages().await.ok()?;
    pages
        .into_iter()
        .find(|p| !baseline.contains(&format!("{:?}", p.target_id())))
}

/// Self-links matching the search URL pattern (`q=`, `pg=`, `posted=`)
/// are invalid regardless of shape (§4.C policy). Markers are anchored on
/// a query parameter boundary (`?q=`/`&q=`) rather than a bare substring,
/// so a valid employer URL carrying an unrelated param that merely ends
/// in `q` (`?faq=1`, `?seq=3`) is not misclassified as a self-link.
pub fn is_listing_self_link(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    SEARCH_PATTERN_MARKERS
        .iter()
        .any(|marker| lower.contains(&format!("?{marker}")) || lower.contains(&format!("&{marker}")))
}

fn is_redirect_wrapper(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    REDIRECT_WRAPPER_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(|h| h.to_ascii_lowercase())
}

fn absolutize(href: &str, base: &str) -> Option<String> {
    if let Ok(parsed) = Url::parse(href) {
        return Some(parsed.to_string());
    }
    let base_url = Url::parse(base).ok()?;
    base_url.join(href).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_links_are_rejected() {
        assert!(is_listing_self_link("https://www.eluta.ca/search?q=python&pg=2"));
        assert!(!is_listing_self_link("https://jobs.examplecorp.com/apply/42"));
    }

    #[test]
    fn params_merely_ending_in_a_marker_are_not_self_links() {
        assert!(!is_listing_self_link("https://jobs.examplecorp.com/apply?faq=1"));
        assert!(!is_listing_self_link("https://jobs.examplecorp.com/apply?seq=3"));
    }

    #[test]
    fn redirect_wrapper_markers_are_detected() {
        assert!(is_redirect_wrapper("https://www.eluta.ca/redirect?url=https://acme.com"));
        assert!(!is_redirect_wrapper("https://jobs.examplecorp.com/apply/42"));
    }

    #[test]
    fn absolutize_resolves_relative_hrefs_against_base() {
        let resolved = absolutize("/redirect?url=foo", "https://www.eluta.ca/search?q=python").unwrap();
        assert_eq!(resolved, "https://www.eluta.ca/redirect?url=foo");
    }

    #[test]
    fn absolute_hrefs_pass_through_unchanged() {
        let resolved = absolutize("https://jobs.examplecorp.com/apply/42", "https://www.eluta.ca/search").unwrap();
        assert_eq!(resolved, "https://jobs.examplecorp.com/apply/42");
    }
}
