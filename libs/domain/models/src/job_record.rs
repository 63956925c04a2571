use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The applicant-tracking-system family inferred from a canonical URL's host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtsSystem {
    Workday,
    Greenhouse,
    Icims,
    Lever,
    Bamboohr,
    Other,
    Unknown,
}

impl AtsSystem {
    /// Classify a canonical URL's host against the known ATS host patterns.
    /// Unreachable/empty URLs classify as `Unknown`; a resolvable host that
    /// matches none of the known families classifies as `Other`.
    pub fn from_canonical_url(canonical_url: &str) -> Self {
        let host = match url::Url::parse(canonical_url) {
            Ok(parsed) => match parsed.host_str() {
                Some(h) => h.to_ascii_lowercase(),
                None => return AtsSystem::Unknown,
            },
            Err(_) => return AtsSystem::Unknown,
        };
        if host.is_empty() {
            return AtsSystem::Unknown;
        }
        const PATTERNS: &[(&str, AtsSystem)] = &[
            ("myworkdayjobs.com", AtsSystem::Workday),
            ("workday.com", AtsSystem::Workday),
            ("icims.com", AtsSystem::Icims),
            ("greenhouse.io", AtsSystem::Greenhouse),
            ("lever.co", AtsSystem::Lever),
            ("bamboohr.com", AtsSystem::Bamboohr),
        ];
        for (needle, ats) in PATTERNS {
            if host.ends_with(needle) || host.contains(needle) {
                return *ats;
            }
        }
        AtsSystem::Other
    }
}

/// Lifecycle state of a [`JobRecord`]. Transitions only move forward
/// (`Scraped` -> `Stage1Scored` -> `Processed`) except via an explicit
/// reset on re-scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Scraped,
    Stage1Scored,
    Processed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Scraped => "scraped",
            Status::Stage1Scored => "stage1_scored",
            Status::Processed => "processed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scraped" => Some(Status::Scraped),
            "stage1_scored" => Some(Status::Stage1Scored),
            "processed" => Some(Status::Processed),
            _ => None,
        }
    }

    /// True if `to` is a legal forward transition from `self` (the only
    /// transitions `Store::advance_status` will accept, aside from the
    /// explicit re-scrape reset back to `Scraped`).
    pub fn can_advance_to(&self, to: Status) -> bool {
        matches!(
            (self, to),
            (Status::Scraped, Status::Stage1Scored)
                | (Status::Stage1Scored, Status::Processed)
                | (_, Status::Scraped)
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("company must not be empty when canonical_url is also absent")]
    MissingCompanyAndUrl,
    #[error("stage2_score present without stage1_score clearing the gate")]
    Stage2WithoutGate,
    #[error("stage2_score present but status is not stage1_scored or processed")]
    Stage2StatusMismatch,
    #[error("timestamps must be monotonic: scraped_at <= stage1_at <= stage2_at <= processed_at")]
    TimestampsOutOfOrder,
}

/// The canonical job entity. See module docs on [`crate`] for the
/// identity/ownership contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    // --- identity ---
    pub fingerprint: String,

    // --- required fields ---
    pub title: String,
    pub company: String,
    pub location: String,
    pub canonical_url: String,
    pub source_site: String,
    pub search_keyword: String,
    pub search_location: String,
    pub scraped_at: DateTime<Utc>,

    // --- optional fields ---
    pub salary_text: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub job_type: Option<String>,
    pub posted_text: Option<String>,
    pub experience_level: Option<String>,
    pub extracted_skills: Vec<String>,
    pub requirements: Vec<String>,
    pub ats_system: AtsSystem,

    // --- processing fields, mutated only by Processor ---
    pub stage1_score: Option<f64>,
    pub stage1_reasons: Vec<String>,
    pub stage2_score: Option<f64>,
    pub final_score: Option<f64>,
    pub status: Status,

    pub last_seen_at: DateTime<Utc>,
    pub stage1_at: Option<DateTime<Utc>>,
    pub stage2_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Check the §3 invariants. Called before any write to the Store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.company.trim().is_empty() && self.canonical_url.trim().is_empty() {
            return Err(ValidationError::MissingCompanyAndUrl);
        }
        if self.stage2_score.is_some() {
            if self.stage1_score.is_none() {
                return Err(ValidationError::Stage2WithoutGate);
            }
            if !matches!(self.status, Status::Stage1Scored | Status::Processed) {
                return Err(ValidationError::Stage2StatusMismatch);
            }
        }
        let ordered = [
            Some(self.scraped_at),
            self.stage1_at,
            self.stage2_at,
            self.processed_at,
        ];
        let mut last = None;
        for ts in ordered.into_iter().flatten() {
            if let Some(prev) = last {
                if ts < prev {
                    return Err(ValidationError::TimestampsOutOfOrder);
                }
            }
            last = Some(ts);
        }
        Ok(())
    }

    /// True if `canonical_url` is non-empty and not a self-link back into
    /// the listing site's own search pattern.
    pub fn has_valid_canonical_url(&self) -> bool {
        !self.canonical_url.trim().is_empty() && !is_listing_self_link(&self.canonical_url)
    }
}

const SEARCH_PATTERN_MARKERS: &[&str] = &["q=", "pg=", "posted="];

/// Self-links matching the search URL pattern (`q=`, `pg=`, `posted=`) are
/// invalid regardless of host, per §4.C. Markers are anchored on a query
/// parameter boundary (`?q=`/`&q=`) rather than a bare substring, so a
/// valid employer URL carrying an unrelated param that merely ends in
/// `q` (`?faq=1`, `?seq=3`) is not misclassified as a listing self-link.
pub fn is_listing_self_link(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    SEARCH_PATTERN_MARKERS
        .iter()
        .any(|marker| lower.contains(&format!("?{marker}")) || lower.contains(&format!("&{marker}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_record() -> JobRecord {
        JobRecord {
            fingerprint: "deadbeef".into(),
            title: "Python Developer".into(),
            company: "Example Corp".into(),
            location: "Remote".into(),
            canonical_url: "https://jobs.examplecorp.com/apply/42".into(),
            source_site: "eluta".into(),
            search_keyword: "python developer".into(),
            search_location: "Toronto".into(),
            scraped_at: Utc::now(),
            salary_text: None,
            summary: None,
            description: None,
            job_type: None,
            posted_text: None,
            experience_level: None,
            extracted_skills: vec![],
            requirements: vec![],
            ats_system: AtsSystem::Unknown,
            stage1_score: None,
            stage1_reasons: vec![],
            stage2_score: None,
            final_score: None,
            status: Status::Scraped,
            last_seen_at: Utc::now(),
            stage1_at: None,
            stage2_at: None,
            processed_at: None,
        }
    }

    #[test]
    fn empty_title_is_invalid() {
        let mut record = base_record();
        record.title = "  ".into();
        assert_eq!(record.validate(), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn empty_company_without_url_is_invalid() {
        let mut record = base_record();
        record.company = "".into();
        record.canonical_url = "".into();
        assert_eq!(
            record.validate(),
            Err(ValidationError::MissingCompanyAndUrl)
        );
    }

    #[test]
    fn empty_company_with_url_is_valid() {
        let mut record = base_record();
        record.company = "".into();
        assert!(record.validate().is_ok());
    }

    #[test]
    fn stage2_without_stage1_scored_status_is_invalid() {
        let mut record = base_record();
        record.stage1_score = Some(0.8);
        record.stage2_score = Some(0.6);
        record.status = Status::Scraped;
        assert_eq!(
            record.validate(),
            Err(ValidationError::Stage2StatusMismatch)
        );
    }

    #[test]
    fn listing_self_links_are_detected() {
        assert!(is_listing_self_link("https://www.eluta.ca/search?q=python&pg=2"));
        assert!(!is_listing_self_link(
            "https://jobs.examplecorp.com/apply/42"
        ));
    }

    #[test]
    fn params_merely_ending_in_a_marker_are_not_self_links() {
        assert!(!is_listing_self_link("https://jobs.examplecorp.com/apply?faq=1"));
        assert!(!is_listing_self_link("https://jobs.examplecorp.com/apply?seq=3"));
        assert!(!is_listing_self_link("https://jobs.examplecorp.com/apply?refq=foo"));
    }

    #[test]
    fn ats_detection_matches_known_hosts() {
        assert_eq!(
            AtsSystem::from_canonical_url("https://acme.myworkdayjobs.com/careers/job/1"),
            AtsSystem::Workday
        );
        assert_eq!(
            AtsSystem::from_canonical_url("https://boards.greenhouse.io/acme/jobs/1"),
            AtsSystem::Greenhouse
        );
        assert_eq!(
            AtsSystem::from_canonical_url("https://jobs.examplecorp.com/apply/42"),
            AtsSystem::Other
        );
        assert_eq!(AtsSystem::from_canonical_url(""), AtsSystem::Unknown);
    }

    #[test]
    fn status_transitions_only_move_forward() {
        assert!(Status::Scraped.can_advance_to(Status::Stage1Scored));
        assert!(Status::Stage1Scored.can_advance_to(Status::Processed));
        assert!(!Status::Processed.can_advance_to(Status::Stage1Scored));
        assert!(Status::Processed.can_advance_to(Status::Scraped));
    }
}
