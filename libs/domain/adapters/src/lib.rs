//! Per-site plug-ins (§4.D). A [`SiteAdapter`] encapsulates everything
//! specific to one job board: how to build a search URL, how to find job
//! cards on a results page, how to read the basic fields off a card, and
//! how to decide the next page. Adapters are stateless between calls —
//! all mutable state (browser leases, seen-sets, retry counters) lives in
//! the Scraper that drives them.

pub mod error;
pub mod eluta;
pub mod indeed;
pub mod jobbank;
pub mod linkedin;
pub mod monster;
pub mod selectors;
pub mod towardsai;
pub mod types;

pub use error::AdapterError;
pub use types::{JobCard, PageState, PaginationOutcome, PartialJobRecord};

/// Capability set every site plug-in implements (§4.D). Instances are
/// immutable and safe to share across worker threads.
pub trait SiteAdapter: Send + Sync {
    /// Stable identifier, also stored as `JobRecord.source_site`.
    fn site_id(&self) -> &'static str;

    /// Build the search-results URL for page `page` (1-indexed) of a
    /// `(keyword, location)` query.
    fn build_search_url(&self, keyword: &str, location: &str, page: u32) -> String;

    /// Locate job-card fragments on a rendered results page. Returns
    /// `AdapterError::Drift` when every selector in the priority list
    /// comes up empty — callers decide whether that is expected (a
    /// genuinely empty results page) or a sign of selector rot.
    fn locate_job_cards(&self, document_html: &str) -> Result<Vec<JobCard>, AdapterError>;

    /// Read the required-minimum and available optional fields off one
    /// card. Missing required fields (`title`, `company`, `location`)
    /// fail with `MissingRequiredField`; missing optional fields are left
    /// `None`.
    fn extract_basic_fields(&self, card: &JobCard) -> Result<PartialJobRecord, AdapterError>;

    /// Decide the next page to visit, or signal the end of results.
    fn paginate(&self, state: &PageState) -> PaginationOutcome {
        if state.cards_on_current_page == 0 {
            return PaginationOutcome::End;
        }
        PaginationOutcome::NextUrl(self.build_search_url(
            &state.keyword,
            &state.location,
            state.current_page + 1,
        ))
    }
}

/// Construct every adapter variant in scope, keyed by `site_id`. The
/// Scraper filters this down to the sites a given `scrape` invocation
/// asked for.
pub fn all_adapters() -> Vec<Box<dyn SiteAdapter>> {
    vec![
        Box::new(eluta::ElutaAdapter),
        Box::new(indeed::IndeedAdapter),
        Box::new(linkedin::LinkedInAdapter),
        Box::new(monster::MonsterAdapter),
        Box::new(jobbank::JobBankAdapter),
        Box::new(towardsai::TowardsAiAdapter),
    ]
}

pub fn by_site_id(site_id: &str) -> Option<Box<dyn SiteAdapter>> {
    all_adapters()
        .into_iter()
        .find(|adapter| adapter.site_id() == site_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ELUTA_PAGE: &str = r#"
        <html><body>
        <div class="organic-job" data-job-id="1">
            <h2 class="title"><a href="/redirect?url=https://jobs.examplecorp.com/apply/42">Senior Python Developer</a></h2>
            <span class="organization">Example Corp</span>
            <span class="location">Toronto, ON</span>
            <span class="salary">$120,000 - $140,000</span>
        </div>
        </body></html>
    "#;

    #[test]
    fn eluta_locates_and_extracts_a_card() {
        let adapter = eluta::ElutaAdapter;
        let cards = adapter.locate_job_cards(ELUTA_PAGE).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(
            cards[0].href.as_deref(),
            Some("/redirect?url=https://jobs.examplecorp.com/apply/42")
        );

        let fields = adapter.extract_basic_fields(&cards[0]).unwrap();
        assert_eq!(fields.title, "Senior Python Developer");
        assert_eq!(fields.company, "Example Corp");
        assert_eq!(fields.location, "Toronto, ON");
        assert!(fields.salary_text.is_some());
    }

    #[test]
    fn empty_page_reports_drift() {
        let adapter = eluta::ElutaAdapter;
        let err = adapter.locate_job_cards("<html><body></body></html>").unwrap_err();
        assert!(matches!(err, AdapterError::Drift { site: "eluta" }));
    }

    #[test]
    fn pagination_stops_on_zero_cards() {
        let adapter = eluta::ElutaAdapter;
        let state = PageState {
            keyword: "python".into(),
            location: "Toronto".into(),
            current_page: 1,
            cards_on_current_page: 0,
        };
        assert_eq!(adapter.paginate(&state), PaginationOutcome::End);
    }

    #[test]
    fn towardsai_never_paginates_past_one_page() {
        let adapter = towardsai::TowardsAiAdapter;
        let state = PageState {
            keyword: "ml engineer".into(),
            location: "Remote".into(),
            current_page: 1,
            cards_on_current_page: 10,
        };
        assert_eq!(adapter.paginate(&state), PaginationOutcome::End);
    }

    #[test]
    fn by_site_id_resolves_every_registered_adapter() {
        for adapter in all_adapters() {
            assert!(by_site_id(adapter.site_id()).is_some());
        }
        assert!(by_site_id("not-a-real-site").is_none());
    }
}
