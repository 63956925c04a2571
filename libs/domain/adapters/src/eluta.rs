//! Eluta.ca: a Canadian aggregator whose result cards are plain `<div>`s
//! with no stable class names across redesigns, hence the long selector
//! fallback chains below.

use scraper::Html;

use crate::error::AdapterError;
use crate::selectors::{first_href, first_non_empty_match, first_text_match, fragment_root};
use crate::types::{JobCard, PageState, PaginationOutcome, PartialJobRecord};
use crate::SiteAdapter;

const CARD_SELECTORS: &[&str] = &[
    "div.organic-job",
    "div[data-job-id]",
    "li.result-item",
    "article",
];
const TITLE_SELECTORS: &[&str] = &["h2.title a", ".title a", "a.job-title", "h2 a", "h2"];
const COMPANY_SELECTORS: &[&str] = &["span.organization", ".company", ".employer"];
const LOCATION_SELECTORS: &[&str] = &["span.location", ".location"];
const SALARY_SELECTORS: &[&str] = &["span.salary", ".salary"];
const POSTED_SELECTORS: &[&str] = &["span.date", ".posted-date", "time"];
const SUMMARY_SELECTORS: &[&str] = &["div.summary", ".description"];
const LINK_SELECTORS: &[&str] = &["h2.title a", ".title a", "a"];

pub struct ElutaAdapter;

impl SiteAdapter for ElutaAdapter {
    fn site_id(&self) -> &'static str {
        "eluta"
    }

    fn build_search_url(&self, keyword: &str, location: &str, page: u32) -> String {
        format!(
            "https://www.eluta.ca/search?q={}&l={}&pg={}&sort=date",
            urlencoding(keyword),
            urlencoding(location),
            page
        )
    }

    fn locate_job_cards(&self, document_html: &str) -> Result<Vec<JobCard>, AdapterError> {
        let document = Html::parse_document(document_html);
        let matches = first_non_empty_match(&document, CARD_SELECTORS);
        if matches.is_empty() {
            return Err(AdapterError::Drift { site: "eluta" });
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
        let root = fragment_root(&fragment)
            .ok_or(AdapterError::Malformed("empty card fragment"))?;

        let title = first_text_match(&root, TITLE_SELECTORS)
            .ok_or(AdapterError::MissingRequiredField { site: "eluta", field: "title" })?;
        let company = first_text_match(&root, COMPANY_SELECTORS)
            .ok_or(AdapterError::MissingRequiredField { site: "eluta", field: "company" })?;
        let location = first_text_match(&root, LOCATION_SELECTORS)
            .ok_or(AdapterError::MissingRequiredField { site: "eluta", field: "location" })?;

        Ok(PartialJobRecord {
            title,
            company,
            location,
            salary_text: first_text_match(&root, SALARY_SELECTORS),
            posted_text: first_text_match(&root, POSTED_SELECTORS),
            summary: first_text_match(&root, SUMMARY_SELECTORS),
        })
    }

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

fn urlencoding(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
