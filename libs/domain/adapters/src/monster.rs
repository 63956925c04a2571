//! Monster.ca. Unlike the others, Monster occasionally serves a
//! no-results page that still 200s and renders a distinct
//! `NO_RESULTS_SELECTORS` marker instead of any job card —
//! `locate_job_cards` treats that marker's presence as a legitimate
//! zero-card page rather than drift; zero cards *and* no marker is still
//! reported as `AdapterError::Drift`.

use scraper::{Html, Selector};

use crate::error::AdapterError;
use crate::selectors::{first_href, first_non_empty_match, first_text_match, fragment_root};
use crate::types::{JobCard, PageState, PaginationOutcome, PartialJobRecord};
use crate::SiteAdapter;

const CARD_SELECTORS: &[&str] = &["section.card-content", "div.job-cardstyle__JobCardComponent"];
const TITLE_SELECTORS: &[&str] = &["h2[data-testid=\"jobTitle\"]", "a.title"];
const COMPANY_SELECTORS: &[&str] = &["div[data-testid=\"company\"]", "div.company"];
const LOCATION_SELECTORS: &[&str] = &["div[data-testid=\"jobLocation\"]", "div.location"];
const SALARY_SELECTORS: &[&str] = &["div[data-testid=\"salary\"]"];
const POSTED_SELECTORS: &[&str] = &["span.posted-date", "time"];
const LINK_SELECTORS: &[&str] = &["a.title", "a"];

/// Markers Monster renders on a genuine no-results page. Their presence
/// is what distinguishes "zero cards because the query matched nothing"
/// from "zero cards because `CARD_SELECTORS` stopped matching" — only the
/// latter is drift.
const NO_RESULTS_SELECTORS: &[&str] = &[
    "div[data-testid=\"no-results\"]",
    "div.no-results",
    "div.mux-search-no-results",
];

pub struct MonsterAdapter;

impl SiteAdapter for MonsterAdapter {
    fn site_id(&self) -> &'static str {
        "monster"
    }

    fn build_search_url(&self, keyword: &str, location: &str, page: u32) -> String {
        format!(
            "https://www.monster.ca/jobs/search?q={}&where={}&page={}",
            urlencoding(keyword),
            urlencoding(location),
            page
        )
    }

    fn locate_job_cards(&self, document_html: &str) -> Result<Vec<JobCard>, AdapterError> {
        let document = Html::parse_document(document_html);
        let matches = first_non_empty_match(&document, CARD_SELECTORS);
        if matches.is_empty() {
            if has_no_results_marker(&document) {
                return Ok(Vec::new());
            }
            return Err(AdapterError::Drift { site: "monster" });
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
                .ok_or(AdapterError::MissingRequiredField { site: "monster", field: "title" })?,
            company: first_text_match(&root, COMPANY_SELECTORS)
                .ok_or(AdapterError::MissingRequiredField { site: "monster", field: "company" })?,
            location: first_text_match(&root, LOCATION_SELECTORS)
                .ok_or(AdapterError::MissingRequiredField { site: "monster", field: "location" })?,
            salary_text: first_text_match(&root, SALARY_SELECTORS),
            posted_text: first_text_match(&root, POSTED_SELECTORS),
            summary: None,
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

fn has_no_results_marker(document: &Html) -> bool {
    NO_RESULTS_SELECTORS.iter().any(|raw| {
        Selector::parse(raw)
            .map(|selector| document.select(&selector).next().is_some())
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_results_marker_yields_empty_cards_not_drift() {
        let adapter = MonsterAdapter;
        let html = r#"<html><body><div class="no-results">No jobs matched your search.</div></body></html>"#;
        let cards = adapter.locate_job_cards(html).unwrap();
        assert!(cards.is_empty());
    }

    #[test]
    fn missing_card_container_and_no_marker_is_drift() {
        let adapter = MonsterAdapter;
        let err = adapter.locate_job_cards("<html><body></body></html>").unwrap_err();
        assert!(matches!(err, AdapterError::Drift { site: "monster" }));
    }
}
