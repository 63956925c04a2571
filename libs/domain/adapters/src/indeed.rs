//! Indeed: result cards live inside `#mosaic-provider-jobcards`, identified
//! by `data-jk` attributes more reliably than by class name.

use scraper::Html;

use crate::error::AdapterError;
use crate::selectors::{first_href, first_non_empty_match, first_text_match, fragment_root};
use crate::types::{JobCard, PageState, PaginationOutcome, PartialJobRecord};
use crate::SiteAdapter;

const CARD_SELECTORS: &[&str] = &[
    "div.job_seen_beacon",
    "div[data-jk]",
    "td.resultContent",
];
const TITLE_SELECTORS: &[&str] = &["h2.jobTitle span", "h2.jobTitle a", "a.jcs-JobTitle"];
const COMPANY_SELECTORS: &[&str] = &["span.companyName", "[data-testid=\"company-name\"]"];
const LOCATION_SELECTORS: &[&str] = &["div.companyLocation", "[data-testid=\"text-location\"]"];
const SALARY_SELECTORS: &[&str] = &["div.salary-snippet-container", "[data-testid=\"attribute_snippet_testid\"]"];
const POSTED_SELECTORS: &[&str] = &["span.date", "span.new"];
const SUMMARY_SELECTORS: &[&str] = &["div.job-snippet", "div.underShelfFooter"];
const LINK_SELECTORS: &[&str] = &["h2.jobTitle a", "a.jcs-JobTitle", "a"];

pub struct IndeedAdapter;

impl SiteAdapter for IndeedAdapter {
    fn site_id(&self) -> &'static str {
        "indeed"
    }

    fn build_search_url(&self, keyword: &str, location: &str, page: u32) -> String {
        let start = (page.saturating_sub(1)) * 10;
        format!(
            "https://www.indeed.com/jobs?q={}&l={}&start={}&sort=date",
            urlencoding(keyword),
            urlencoding(location),
            start
        )
    }

    fn locate_job_cards(&self, document_html: &str) -> Result<Vec<JobCard>, AdapterError> {
        let document = Html::parse_document(document_html);
        let matches = first_non_empty_match(&document, CARD_SELECTORS);
        if matches.is_empty() {
            return Err(AdapterError::Drift { site: "indeed" });
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
                .ok_or(AdapterError::MissingRequiredField { site: "indeed", field: "title" })?,
            company: first_text_match(&root, COMPANY_SELECTORS)
                .ok_or(AdapterError::MissingRequiredField { site: "indeed", field: "company" })?,
            location: first_text_match(&root, LOCATION_SELECTORS)
                .ok_or(AdapterError::MissingRequiredField { site: "indeed", field: "location" })?,
            salary_text: first_text_match(&root, SALARY_SELECTORS),
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
