//! Towards AI's community job board — a single long results page rather
//! than server-side pagination, so `paginate` always reports `End` once
//! the page has been scraped once.

use scraper::Html;

use crate::error::AdapterError;
use crate::selectors::{first_href, first_non_empty_match, first_text_match, fragment_root};
use crate::types::{JobCard, PageState, PaginationOutcome, PartialJobRecord};
use crate::SiteAdapter;

const CARD_SELECTORS: &[&str] = &["div.job-listing", "tr.job-row", "li.job-item"];
const TITLE_SELECTORS: &[&str] = &["h3.job-title a", "a.job-link"];
const COMPANY_SELECTORS: &[&str] = &["span.company-name", ".company"];
const LOCATION_SELECTORS: &[&str] = &["span.job-location", ".location"];
const POSTED_SELECTORS: &[&str] = &["span.posted", "time"];
const LINK_SELECTORS: &[&str] = &["h3.job-title a", "a.job-link", "a"];

pub struct TowardsAiAdapter;

impl SiteAdapter for TowardsAiAdapter {
    fn site_id(&self) -> &'static str {
        "towardsai"
    }

    fn build_search_url(&self, keyword: &str, _location: &str, _page: u32) -> String {
        format!("https://jobs.towardsai.net/?search={}", urlencoding(keyword))
    }

    fn locate_job_cards(&self, document_html: &str) -> Result<Vec<JobCard>, AdapterError> {
        let document = Html::parse_document(document_html);
        let matches = first_non_empty_match(&document, CARD_SELECTORS);
        if matches.is_empty() {
            return Err(AdapterError::Drift { site: "towardsai" });
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
                .ok_or(AdapterError::MissingRequiredField { site: "towardsai", field: "title" })?,
            company: first_text_match(&root, COMPANY_SELECTORS)
                .ok_or(AdapterError::MissingRequiredField { site: "towardsai", field: "company" })?,
            location: first_text_match(&root, LOCATION_SELECTORS)
                .unwrap_or_else(|| "Remote".to_string()),
            salary_text: None,
            posted_text: first_text_match(&root, POSTED_SELECTORS),
            summary: None,
        })
    }

    fn paginate(&self, _state: &PageState) -> PaginationOutcome {
        PaginationOutcome::End
    }
}

fn urlencoding(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
