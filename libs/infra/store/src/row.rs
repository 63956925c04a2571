//! `JobRecord` <-> SQL row mapping. Isolated from `store.rs` so the
//! column list only needs to be kept in sync with `schema.rs` in one
//! place.

use chrono::{DateTime, Utc};
use jobscout_domain_models::{AtsSystem, JobRecord, Status};
use rusqlite::Row;

use crate::error::StoreError;

pub const SELECT_COLUMNS: &str = "fingerprint, title, company, location, canonical_url, \
    source_site, search_keyword, search_location, scraped_at, salary_text, summary, \
    description, job_type, posted_text, experience_level, extracted_skills, requirements, \
    ats_system, stage1_score, stage1_reasons, stage2_score, final_score, status, \
    last_seen_at, stage1_at, stage2_at, processed_at, schema_version";

pub fn ats_to_str(ats: AtsSystem) -> &'static str {
    match ats {
        AtsSystem::Workday => "workday",
        AtsSystem::Greenhouse => "greenhouse",
        AtsSystem::Icims => "icims",
        AtsSystem::Lever => "lever",
        AtsSystem::Bamboohr => "bamboohr",
        AtsSystem::Other => "other",
        AtsSystem::Unknown => "unknown",
    }
}

pub fn ats_from_str(raw: &str) -> AtsSystem {
    match raw {
        "workday" => AtsSystem::Workday,
        "greenhouse" => AtsSystem::Greenhouse,
        "icims" => AtsSystem::Icims,
        "lever" => AtsSystem::Lever,
        "bamboohr" => AtsSystem::Bamboohr,
        "other" => AtsSystem::Other,
        _ => AtsSystem::Unknown,
    }
}

pub fn json_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

pub fn parse_json_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

pub fn from_row(row: &Row<'_>) -> Result<JobRecord, StoreError> {
    let extracted_skills_raw: String = row.get("extracted_skills")?;
    let requirements_raw: String = row.get("requirements")?;
    let stage1_reasons_raw: String = row.get("stage1_reasons")?;
    let ats_raw: String = row.get("ats_system")?;
    let status_raw: String = row.get("status")?;

    Ok(JobRecord {
        fingerprint: row.get("fingerprint")?,
        title: row.get("title")?,
        company: row.get("company")?,
        location: row.get("location")?,
        canonical_url: row.get("canonical_url")?,
        source_site: row.get("source_site")?,
        search_keyword: row.get("search_keyword")?,
        search_location: row.get("search_location")?,
        scraped_at: row.get::<_, DateTime<Utc>>("scraped_at")?,
        salary_text: row.get("salary_text")?,
        summary: row.get("summary")?,
        description: row.get("description")?,
        job_type: row.get("job_type")?,
        posted_text: row.get("posted_text")?,
        experience_level: row.get("experience_level")?,
        extracted_skills: parse_json_list(&extracted_skills_raw),
        requirements: parse_json_list(&requirements_raw),
        ats_system: ats_from_str(&ats_raw),
        stage1_score: row.get("stage1_score")?,
        stage1_reasons: parse_json_list(&stage1_reasons_raw),
        stage2_score: row.get("stage2_score")?,
        final_score: row.get("final_score")?,
        status: Status::parse(&status_raw).unwrap_or(Status::Scraped),
        last_seen_at: row.get::<_, DateTime<Utc>>("last_seen_at")?,
        stage1_at: row.get("stage1_at")?,
        stage2_at: row.get("stage2_at")?,
        processed_at: row.get("processed_at")?,
    })
}
