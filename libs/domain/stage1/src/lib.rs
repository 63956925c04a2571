//! Fast, rule-based per-job evaluation that gates Stage2 (§4.G). Purely
//! functional: `evaluate` takes a `JobRecord`, a `Profile`, and the set
//! of fingerprints already at or beyond `stage1_scored` this run, and
//! always returns the same `Stage1Outcome` for the same inputs.
//!
//! Grounded in the original `JobRelevanceFilter` (`job_filters.py`):
//! target-role substring matching against an allow-list plus an
//! excluded-keyword deny-list, generalized here to read both lists from
//! `Profile` instead of hard-coding them, since the job-discovery system
//! treats the filter as profile-driven.

use std::collections::HashSet;

use jobscout_domain_models::{JobRecord, Profile};

/// Default gate threshold (§4.G): a record with `stage1_score` below
/// this is not promoted to Stage2.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

const SENIORITY_TOKENS: &[(&str, Seniority)] = &[
    ("distinguished", Seniority::Distinguished),
    ("principal", Seniority::Principal),
    ("staff", Seniority::Staff),
    ("senior", Seniority::Senior),
    ("lead", Seniority::Lead),
    ("manager", Seniority::Manager),
    ("new grad", Seniority::EntryLevel),
    ("entry level", Seniority::EntryLevel),
    ("co-op", Seniority::Intern),
    ("intern", Seniority::Intern),
    ("junior", Seniority::EntryLevel),
];

const SOFTWARE_ROLE_TERMS: &[&str] = &["software", "python", "application", "web", "api", "microservices"];
const DEVELOPER_TERMS: &[&str] = &["developer", "engineer"];

/// Coarse seniority bucket read off a job title's tokens (§4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seniority {
    Intern,
    EntryLevel,
    Mid,
    Senior,
    Staff,
    Principal,
    Distinguished,
    Lead,
    Manager,
}

impl Seniority {
    fn classify(title: &str) -> Self {
        for (token, seniority) in SENIORITY_TOKENS {
            if title.contains(token) {
                return *seniority;
            }
        }
        Seniority::Mid
    }

    /// True if this level is outside what `profile` wants, independent
    /// of the title-term deny-list (§4.G "seniority classification").
    fn matches_profile(&self, profile: &Profile) -> bool {
        match self {
            Seniority::Intern | Seniority::EntryLevel => profile.include_entry_level,
            Seniority::Staff | Seniority::Principal | Seniority::Distinguished | Seniority::Manager => {
                profile
                    .seniority_preferences
                    .iter()
                    .any(|p| matches!(p.to_ascii_lowercase().as_str(), "staff" | "principal" | "senior" | "lead"))
            }
            Seniority::Senior | Seniority::Lead | Seniority::Mid => true,
        }
    }
}

/// Weighted contributions to `stage1_score`. Each computation in §4.G
/// contributes one term and appends a human-readable reason.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage1Outcome {
    pub score: f64,
    pub reasons: Vec<String>,
    pub passes_gate: bool,
    pub seniority: Seniority,
}

/// `evaluate` with the default threshold (§4.G).
pub fn evaluate(record: &JobRecord, profile: &Profile, scored_fingerprints: &HashSet<String>) -> Stage1Outcome {
    evaluate_with_threshold(record, profile, scored_fingerprints, DEFAULT_THRESHOLD)
}

pub fn evaluate_with_threshold(
    record: &JobRecord,
    profile: &Profile,
    scored_fingerprints: &HashSet<String>,
    threshold: f64,
) -> Stage1Outcome {
    let title_lower = record.title.to_ascii_lowercase();
    let mut reasons = Vec::new();

    // URL validity and duplicate check are hard gates: either one drops
    // the record straight to a zero score regardless of the other terms.
    if !record.has_valid_canonical_url() {
        reasons.push("canonical_url is empty or a listing self-link".to_string());
        return Stage1Outcome {
            score: 0.0,
            reasons,
            passes_gate: false,
            seniority: Seniority::classify(&title_lower),
        };
    }

    if scored_fingerprints.contains(&record.fingerprint) {
        reasons.push("duplicate fingerprint already at or beyond stage1_scored".to_string());
        return Stage1Outcome {
            score: 0.0,
            reasons,
            passes_gate: false,
            seniority: Seniority::classify(&title_lower),
        };
    }

    if let Some(excluded) = matched_excluded_term(&title_lower, &profile.excluded_title_terms) {
        reasons.push(format!("title matches excluded term \"{excluded}\""));
        return Stage1Outcome {
            score: 0.0,
            reasons,
            passes_gate: false,
            seniority: Seniority::classify(&title_lower),
        };
    }

    let seniority = Seniority::classify(&title_lower);

    let title_score = title_relevance(&title_lower, profile);
    reasons.push(format!("title relevance score {title_score:.2}"));

    let location_ok = profile.allows_location(&record.location);
    reasons.push(if location_ok {
        format!("location \"{}\" matches profile preferences", record.location)
    } else {
        format!("location \"{}\" does not match profile preferences", record.location)
    });
    let location_score = if location_ok { 1.0 } else { 0.0 };

    let seniority_ok = seniority.matches_profile(profile);
    reasons.push(format!("seniority classified as {seniority:?}, profile match: {seniority_ok}"));
    let seniority_score = if seniority_ok { 1.0 } else { 0.0 };

    let score = (0.5 * title_score + 0.3 * location_score + 0.2 * seniority_score).clamp(0.0, 1.0);
    let passes_gate = score >= threshold;

    Stage1Outcome {
        score,
        reasons,
        passes_gate,
        seniority,
    }
}

fn matched_excluded_term<'a>(title_lower: &str, excluded_terms: &'a [String]) -> Option<&'a str> {
    excluded_terms
        .iter()
        .find(|term| title_lower.contains(term.to_ascii_lowercase().as_str()))
        .map(|s| s.as_str())
}

/// Allow-list match: the profile's own keywords, plus the generic
/// software-role vocabulary the original filter always accepted
/// (`job_filters.py`'s hard-coded `target_roles` set).
fn title_relevance(title_lower: &str, profile: &Profile) -> f64 {
    if profile.keywords.iter().any(|k| title_lower.contains(k.to_ascii_lowercase().as_str())) {
        return 1.0;
    }

    let has_role_term = SOFTWARE_ROLE_TERMS.iter().any(|t| title_lower.contains(t));
    let has_developer_term = DEVELOPER_TERMS.iter().any(|t| title_lower.contains(t));
    if has_role_term && has_developer_term {
        return 0.8;
    }

    0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jobscout_domain_models::{AtsSystem, Status};

    fn profile() -> Profile {
        Profile {
            name: "p".into(),
            keywords: vec!["python developer".into()],
            skills: vec!["python".into()],
            preferred_locations: vec!["Toronto".into()],
            allow_remote: true,
            seniority_preferences: vec![],
            document_paths: vec![],
            excluded_title_terms: vec!["principal engineer".into(), "staff engineer".into()],
            include_entry_level: true,
        }
    }

    fn record(title: &str, location: &str, canonical_url: &str) -> JobRecord {
        JobRecord {
            fingerprint: format!("fp-{title}"),
            title: title.into(),
            company: "Acme".into(),
            location: location.into(),
            canonical_url: canonical_url.into(),
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
    fn gating_scenario_matches_spec_example_5() {
        let profile = profile();
        let seen = HashSet::new();

        let senior_onsite = record(
            "Senior Principal Architect",
            "New York, NY",
            "https://jobs.examplecorp.com/apply/1",
        );
        let junior_remote = record(
            "Junior Python Developer",
            "Remote",
            "https://jobs.examplecorp.com/apply/2",
        );

        let a = evaluate(&senior_onsite, &profile, &seen);
        let b = evaluate(&junior_remote, &profile, &seen);

        assert!(a.score < DEFAULT_THRESHOLD, "expected A below gate, got {}", a.score);
        assert!(!a.passes_gate);
        assert!(b.score >= DEFAULT_THRESHOLD, "expected B at/above gate, got {}", b.score);
        assert!(b.passes_gate);
    }

    #[test]
    fn invalid_url_drops_below_gate_regardless_of_title() {
        let profile = profile();
        let seen = HashSet::new();
        let rec = record("Python Developer", "Toronto", "");
        let outcome = evaluate(&rec, &profile, &seen);
        assert_eq!(outcome.score, 0.0);
        assert!(!outcome.passes_gate);
    }

    #[test]
    fn listing_self_link_fails_url_validity() {
        let profile = profile();
        let seen = HashSet::new();
        let rec = record(
            "Python Developer",
            "Toronto",
            "https://www.eluta.ca/search?q=python&pg=2",
        );
        let outcome = evaluate(&rec, &profile, &seen);
        assert_eq!(outcome.score, 0.0);
    }

    #[test]
    fn duplicate_fingerprint_is_dropped() {
        let profile = profile();
        let rec = record("Python Developer", "Toronto", "https://acme.example.com/apply/1");
        let mut seen = HashSet::new();
        seen.insert(rec.fingerprint.clone());
        let outcome = evaluate(&rec, &profile, &seen);
        assert_eq!(outcome.score, 0.0);
        assert!(outcome.reasons.iter().any(|r| r.contains("duplicate")));
    }

    #[test]
    fn excluded_title_term_overrides_keyword_match() {
        let profile = profile();
        let seen = HashSet::new();
        let rec = record(
            "Staff Engineer, Python Platform",
            "Toronto",
            "https://acme.example.com/apply/1",
        );
        let outcome = evaluate(&rec, &profile, &seen);
        assert_eq!(outcome.score, 0.0);
    }

    #[test]
    fn same_inputs_yield_same_outputs() {
        let profile = profile();
        let seen = HashSet::new();
        let rec = record("Python Developer", "Remote", "https://acme.example.com/apply/1");
        let first = evaluate(&rec, &profile, &seen);
        let second = evaluate(&rec, &profile, &seen);
        assert_eq!(first, second);
    }
}
