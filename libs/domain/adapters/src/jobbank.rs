//! Job Bank (Government of Canada). No salary field on the listing page;
//! `posted_text` is rendered as a relative date (`"il y a 3 jours"` /
//! `"3 days ago"`) left unparsed here — Stage1/Stage2 consume it as text.

use scraper::Html;

use crate::error::AdapterError;
use crate::selectors::{first_href, first_non_empty_match, first_text_match, fragment_root};
use crate::types::{JobCard, PageState, PaginationOutcome, PartialJobRecord};
use crate::SiteAdapter;

const CARD_SELECTORS: &[&str] = &["article.action-buttons", "div.resultJobItem"];
const TITLE_SELECTORS: &[&str] = &["span.noctitle", "a.resultJobItem"];
const COMPANY_SELECTORS: &[&str] = &["li.business", "span.business"];
const LOCATION_SELECTORS: &[&str] = &["li.location", "span.location"];
const POSTED_SELECTORS: &[&str] = &["li.date", "span.date"];
const LINK_SELECTORS: &[&str] = &["a.resultJobItem", "a"];

pub struct JobBankAdapter;

impl SiteAdapter for JobBankAdapter {
    fn site_id(&self) -> &'static str {
        "jobbank"
    }

    fn build_search_url(&self, keyword: &str, location: &str, page: u32) -> String {
        format!(
            "https://www.jobbank.gc.ca/jobsearch/jobsearch?searchstring={}&locationstring={}&page={}&sort=D",
            urlencoding(keyword),
            urlencoding(location),
            page
        )
    }

    fn locate_job_cards(&self, document_html: &str) -> Result<Vec<JobCard>, AdapterError> {
        let document = Html::parse_document(document_html);
        let matches = first_non_empty_match(&document, CARD_SELECTORS);
        if matches.is_empty() {
            return Err(AdapterError::Drift { site: "jobbank" });
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
                .ok_or(AdapterError::MissingRequiredField { site: "jobbank", field: "title" })?,
            company: first_text_match(&root, COMPANY_SELECTORS)
                .ok_or(AdapterError::MissingRequiredField { site: "jobbank", field: "company" })?,
            location: first_text_match(&root, LOCATION_SELECTORS)
                .ok_or(AdapterError::MissingRequiredField { site: "jobbank", field: "location" })?,
            salary_text: None,
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
