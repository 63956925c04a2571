//! LinkedIn's public (logged-out) job search results. Pagination is
//! offset-based in steps of 25, matching the site's `start=` parameter.

use scraper::Html;

use crate::error::AdapterError;
use crate::selectors::{first_href, first_non_empty_match, first_text_match, fragment_root};
use crate::types::{JobCard, PageState, PaginationOutcome, PartialJobRecord};
use crate::SiteAdapter;

const CARD_SELECTORS: &[&str] = &["div.base-card", "li.jobs-search-results__list-item", "div.job-search-card"];
const TITLE_SELECTORS: &[&str] = &["h3.base-search-card__title", "a.base-card__full-link span"];
const COMPANY_SELECTORS: &[&str] = &["h4.base-search-card__subtitle", "a.hidden-nested-link"];
const LOCATION_SELECTORS: &[&str] = &["span.job-search-card__location"];
const POSTED_SELECTORS: &[&str] = &["time.job-search-card__listdate", "time"];
const SUMMARY_SELECTORS: &[&str] = &["p.job-search-card__snippet"];
const LINK_SELECTORS: &[&str] = &["a.base-card__full-link", "a"];

pub struct LinkedInAdapter;

impl SiteAdapter for LinkedInAdapter {
    fn site_id(&self) -> &'static str {
        "linkedin"
    }

    fn build_search_url(&self, keyword: &str, location: &str, page: u32) -> String {
        let start = (page.saturating_sub(1)) * 25;
        format!(
            "https://www.linkedin.com/jobs/search?keywords={}&location={}&start={}&sortBy=DD",
            urlencoding(keyword),
            urlencoding(location),
            start
        )
    }

    fn locate_job_cards(&self, document_html: &str) -> Result<Vec<JobCard>, AdapterError> {
        let document = Html::parse_document(document_html);
        let matches = first_non_empty_match(&document, CARD_SELECTORS);
        if matches.is_empty() {
            return Err(AdapterError::Drift { site: "linkedin" });
        }
        Ok(matches
            .into_iter()
            .map(|element| JobCard {
                fragment_html: element.html(),
                href: first_href(&element, LINK_SELECTORS),
            })
            .collect())
    }

    fn extract_basic_fields(&self, card: &JobCard) -> Result<PartialJobRecord, AdapterError> {
        let fragment = Html::parse_fragment(&card.fragment_html);
        let root = fragment_root(&fragment).ok_or(AdapterError::Malformed("empty card fragment"))?;

        Ok(PartialJobRecord {
            title: first_text_match(&root, TITLE_SELECTORS)
                .ok_or(AdapterError::MissingRequiredField { site: "linkedin", field: "title" })?,
            company: first_text_match(&root, COMPANY_SELECTORS)
                .ok_or(AdapterError::MissingRequiredField { site: "linkedin", field: "company" })?,
            location: first_text_match(&root, LOCATION_SELECTORS)
                .ok_or(AdapterError::MissingRequiredField { site: "linkedin", field: "location" })?,
            salary_text: None,
            posted_text: first_text_match(&root, POSTED_SELECTORS),
            summary: first_text_match(&root, SUMMARY_SELECTORS),
        })
    }

    fn paginate(&self, state: &PageState) -> PaginationOutcome {
        if state.cards_on_current_page == 0 {
            return PaginationOutcome::End;
        }
        PaginationOutcome::NextUrl(self.build_search_url(&state.keyword, &state.location, state.current_page + 1))
    }
}

fn urlencoding(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
