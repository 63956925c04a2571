use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use jobscout_domain_models::{JobRecord, Profile};

use crate::{Stage2Analyzer, Stage2Error, Stage2Outcome};

/// Wraps any [`Stage2Analyzer`] with an in-process cache keyed by
/// fingerprint, so a replayed analysis (re-running `process` after a
/// partial failure, or against a re-scraped posting) is free instead of
/// re-paying a model call. Per §4.H: "implementations are expected to
/// cache by fingerprint so replays are free" — this makes that true of
/// any inner analyzer without each one reimplementing it.
pub struct CachingAnalyzer<A: Stage2Analyzer> {
    inner: A,
    cache: Mutex<HashMap<String, Stage2Outcome>>,
}

impl<A: Stage2Analyzer> CachingAnalyzer<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<A: Stage2Analyzer> Stage2Analyzer for CachingAnalyzer<A> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn analyze(&self, record: &JobRecord, profile: &Profile) -> Result<Stage2Outcome, Stage2Error> {
        if let Some(cached) = self.cache.lock().unwrap().get(&record.fingerprint) {
            return Ok(cached.clone());
        }
        let outcome = self.inner.analyze(record, profile).await?;
        self.cache
            .lock()
            .unwrap()
            .insert(record.fingerprint.clone(), outcome.clone());
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingAnalyzer {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Stage2Analyzer for CountingAnalyzer {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn analyze(&self, _record: &JobRecord, _profile: &Profile) -> Result<Stage2Outcome, Stage2Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Stage2Outcome {
                semantic_score: 1.0,
                rationale: "counted".into(),
                extracted_skills: vec![],
                requirements: vec![],
            })
        }
    }

    fn sample_record(fingerprint: &str) -> JobRecord {
        use chrono::Utc;
        use jobscout_domain_models::{AtsSystem, Status};
        JobRecord {
            fingerprint: fingerprint.into(),
            title: "Python Developer".into(),
            company: "Acme".into(),
            location: "Remote".into(),
            canonical_url: "https://acme.example.com/apply/1".into(),
            source_site: "eluta".into(),
            search_keyword: "python".into(),
            search_location: "Remote".into(),
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
            stage1_score: Some(0.8),
            stage1_reasons: vec![],
            stage2_score: None,
            final_score: None,
            status: Status::Stage1Scored,
            last_seen_at: Utc::now(),
            stage1_at: Some(Utc::now()),
            stage2_at: None,
            processed_at: None,
        }
    }

    #[tokio::test]
    async fn repeated_analysis_of_same_fingerprint_hits_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cached = CachingAnalyzer::new(CountingAnalyzer { calls: calls.clone() });
        let profile = Profile {
            name: "p".into(),
            keywords: vec![],
            skills: vec![],
            preferred_locations: vec![],
            allow_remote: true,
            seniority_preferences: vec![],
            document_paths: vec![],
            excluded_title_terms: vec![],
            include_entry_level: true,
        };
        let record = sample_record("fp-1");

        cached.analyze(&record, &profile).await.unwrap();
        cached.analyze(&record, &profile).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
