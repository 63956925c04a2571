use async_trait::async_trait;
use jobscout_domain_models::{JobRecord, Profile};

use crate::{Stage2Analyzer, Stage2Error, Stage2Outcome};

/// Scores keyword overlap between `Profile.skills` and the job's
/// `extracted_skills`/`description`/`summary`, weighted by a small
/// rubric. Runnable without any external model server, so the pipeline
/// has a working Stage2 out of the box.
pub struct HeuristicAnalyzer {
    /// Weight given to skills the adapter already extracted structurally,
    /// vs. skills only found by scanning free text.
    structured_skill_weight: f64,
}

impl Default for HeuristicAnalyzer {
    fn default() -> Self {
        Self {
            structured_skill_weight: 0.7,
        }
    }
}

impl HeuristicAnalyzer {
    pub fn new(structured_skill_weight: f64) -> Self {
        Self { structured_skill_weight }
    }

    fn matched_skills(&self, record: &JobRecord, profile: &Profile) -> (Vec<String>, f64) {
        if profile.skills.is_empty() {
            return (Vec::new(), 0.5);
        }

        let haystack_structured: Vec<String> = record
            .extracted_skills
            .iter()
            .map(|s| s.to_ascii_lowercase())
            .collect();
        let haystack_text = format!(
            "{} {}",
            record.description.as_deref().unwrap_or_default(),
            record.summary.as_deref().unwrap_or_default()
        )
        .to_ascii_lowercase();

        let mut matched = Vec::new();
        let mut structured_hits = 0usize;
        let mut text_hits = 0usize;
        for skill in &profile.skills {
            let skill_lower = skill.to_ascii_lowercase();
            if haystack_structured.iter().any(|s| s == &skill_lower) {
                structured_hits += 1;
                matched.push(skill.clone());
            } else if haystack_text.contains(&skill_lower) {
                text_hits += 1;
                matched.push(skill.clone());
            }
        }

        let total = profile.skills.len() as f64;
        let structured_fraction = structured_hits as f64 / total;
        let text_fraction = text_hits as f64 / total;
        let score = (structured_fraction * self.structured_skill_weight
            + text_fraction * (1.0 - self.structured_skill_weight))
            .min(1.0);
        (matched, score)
    }
}

#[async_trait]
impl Stage2Analyzer for HeuristicAnalyzer {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn analyze(&self, record: &JobRecord, profile: &Profile) -> Result<Stage2Outcome, Stage2Error> {
        let (matched_skills, skill_score) = self.matched_skills(record, profile);

        let rationale = if matched_skills.is_empty() {
            "no overlap between profile skills and job content; falling back to neutral score".to_string()
        } else {
            format!("matched skills: {}", matched_skills.join(", "))
        };

        Ok(Stage2Outcome {
            semantic_score: skill_score,
            rationale,
            extracted_skills: matched_skills,
            requirements: record.requirements.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jobscout_domain_models::{AtsSystem, Status};

    fn record_with(extracted_skills: Vec<&str>, description: &str) -> JobRecord {
        JobRecord {
            fingerprint: "fp".into(),
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
            description: Some(description.to_string()),
            job_type: None,
            posted_text: None,
            experience_level: None,
            extracted_skills: extracted_skills.into_iter().map(String::from).collect(),
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

    fn profile_with(skills: Vec<&str>) -> Profile {
        Profile {
            name: "p".into(),
            keywords: vec!["python".into()],
            skills: skills.into_iter().map(String::from).collect(),
            preferred_locations: vec!["Remote".into()],
            allow_remote: true,
            seniority_preferences: vec![],
            document_paths: vec![],
            excluded_title_terms: vec![],
            include_entry_level: true,
        }
    }

    #[tokio::test]
    async fn structured_skill_match_scores_higher_than_text_only() {
        let analyzer = HeuristicAnalyzer::default();
        let profile = profile_with(vec!["python", "django"]);

        let structured = record_with(vec!["python", "django"], "");
        let text_only = record_with(vec![], "we use python and django here");

        let structured_outcome = analyzer.analyze(&structured, &profile).await.unwrap();
        let text_outcome = analyzer.analyze(&text_only, &profile).await.unwrap();

        assert!(structured_outcome.semantic_score > text_outcome.semantic_score);
    }

    #[tokio::test]
    async fn no_profile_skills_yields_neutral_score() {
        let analyzer = HeuristicAnalyzer::default();
        let profile = profile_with(vec![]);
        let record = record_with(vec!["python"], "");

        let outcome = analyzer.analyze(&record, &profile).await.unwrap();
        assert_eq!(outcome.semantic_score, 0.5);
        assert!(outcome.extracted_skills.is_empty());
    }
}
