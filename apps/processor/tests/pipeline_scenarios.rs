//! End-to-end scenarios against the public `Processor` API and a real
//! (in-memory) `Store`, seeded the way job-discovery-core's own test
//! suite seeds scenarios 5 and 6: two on-disk-shaped records scraped
//! already, scored through both stages.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use jobscout_app_processor::{ProcessLimits, Processor};
use jobscout_domain_models::{AtsSystem, JobRecord, Profile, Status};
use jobscout_domain_stage2::{Stage2Analyzer, Stage2Error, Stage2Outcome};
use jobscout_infra_store::Store;
use jobscout_shared_context::RunContext;

fn profile() -> Profile {
    Profile {
        name: "p".into(),
        keywords: vec!["python developer".into()],
        skills: vec!["python".into(), "django".into()],
        preferred_locations: vec!["Toronto".into()],
        allow_remote: true,
        seniority_preferences: vec![],
        document_paths: vec![],
        excluded_title_terms: vec!["senior".into(), "principal".into()],
        include_entry_level: true,
    }
}

fn record(title: &str, company: &str, location: &str, canonical_url: &str) -> JobRecord {
    let fingerprint =
        jobscout_domain_models::fingerprint::fingerprint(title, company, location, Some(canonical_url), false);
    JobRecord {
        fingerprint,
        title: title.to_string(),
        company: company.to_string(),
        location: location.to_string(),
        canonical_url: canonical_url.to_string(),
        source_site: "eluta".into(),
        search_keyword: "python developer".into(),
        search_location: "Toronto".into(),
        scraped_at: Utc::now(),
        salary_text: None,
        summary: None,
        description: Some("Python, Django, REST APIs.".into()),
        job_type: None,
        posted_text: None,
        experience_level: None,
        extracted_skills: vec!["python".into()],
        requirements: vec![],
        ats_system: AtsSystem::from_canonical_url(canonical_url),
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

struct AlwaysOutageAnalyzer;

#[async_trait]
impl Stage2Analyzer for AlwaysOutageAnalyzer {
    fn name(&self) -> &'static str {
        "always-outage"
    }

    async fn analyze(&self, _record: &JobRecord, _profile: &Profile) -> Result<Stage2Outcome, Stage2Error> {
        Err(Stage2Error::Transient("model server down".to_string()))
    }
}

struct WorkingAnalyzer;

#[async_trait]
impl Stage2Analyzer for WorkingAnalyzer {
    fn name(&self) -> &'static str {
        "working"
    }

    async fn analyze(&self, _record: &JobRecord, _profile: &Profile) -> Result<Stage2Outcome, Stage2Error> {
        Ok(Stage2Outcome {
            semantic_score: 0.9,
            rationale: "strong skills overlap".to_string(),
            extracted_skills: vec!["python".into(), "django".into()],
            requirements: vec![],
        })
    }
}

/// Scenario 5 (§8): a too-senior, on-site posting fails the Stage1 gate
/// and never reaches Stage2, while a junior remote posting clears the
/// gate and is fully processed.
#[tokio::test]
async fn two_stage_gating_separates_a_senior_onsite_role_from_a_junior_remote_one() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let profile = profile();

    let senior_onsite = record(
        "Senior Principal Architect",
        "BigCorp",
        "San Francisco, CA",
        "https://bigcorp.com/careers/1",
    );
    let junior_remote = record(
        "Junior Python Developer",
        "Acme",
        "Remote",
        "https://acme.com/careers/2",
    );
    store.upsert(&senior_onsite).unwrap();
    store.upsert(&junior_remote).unwrap();

    let processor = Processor::new(Arc::new(WorkingAnalyzer), ProcessLimits::default());
    let ctx = RunContext::new(store.clone());
    let summary = processor.process(&profile, &ctx).await;

    assert_eq!(summary.stage1_evaluated, 2);
    assert_eq!(summary.stage1_passed_gate, 1);
    assert_eq!(summary.stage1_dropped, 1);
    assert_eq!(summary.finalized, 1);

    let senior_after = store.get(&senior_onsite.fingerprint).unwrap().unwrap();
    assert!(senior_after.stage1_score.unwrap() < jobscout_domain_stage1::DEFAULT_THRESHOLD);
    assert!(senior_after.stage2_score.is_none());
    assert_eq!(senior_after.status, Status::Stage1Scored);

    let junior_after = store.get(&junior_remote.fingerprint).unwrap().unwrap();
    assert!(junior_after.stage1_score.unwrap() >= jobscout_domain_stage1::DEFAULT_THRESHOLD);
    assert!(junior_after.stage2_score.is_some());
    assert_eq!(junior_after.status, Status::Processed);
}

/// Scenario 6 (§8): Stage2 failing on every call leaves every
/// gate-passing record parked at `stage1_scored` with no `stage2_score`,
/// and the Processor's run completes rather than erroring out.
#[tokio::test]
async fn stage2_outage_leaves_gate_passing_records_at_stage1_scored() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let profile = profile();

    let junior_remote = record(
        "Junior Python Developer",
        "Acme",
        "Remote",
        "https://acme.com/careers/3",
    );
    store.upsert(&junior_remote).unwrap();

    let processor = Processor::new(Arc::new(AlwaysOutageAnalyzer), ProcessLimits::default());
    let ctx = RunContext::new(store.clone());
    let summary = processor.process(&profile, &ctx).await;

    assert!(summary.is_stage2_outage());
    assert_eq!(summary.finalized, 0);

    let after = store.get(&junior_remote.fingerprint).unwrap().unwrap();
    assert_eq!(after.status, Status::Stage1Scored);
    assert!(after.stage2_score.is_none());
    assert!(after.stage1_score.is_some());
}
