//! The `Store` itself: a pooled, file-backed SQLite connection with
//! upsert-by-fingerprint, CAS status transitions, filtered query, and
//! stats. Every write goes through a `BEGIN IMMEDIATE` transaction so two
//! workers racing on the same fingerprint serialize rather than
//! interleave, following a transactional CAS pattern (read current
//! state, decide, write, commit-or-fail inside one transaction)
//! generalized from a single zombie-reclaim query to the
//! upsert/advance/score-write operations this store needs.

use std::path::Path;

use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use tracing::{debug, instrument};

use jobscout_domain_models::{AtsSystem, JobRecord, Status};

use crate::error::StoreError;
use crate::filter::JobFilter;
use crate::row::{ats_to_str, from_row, json_list, SELECT_COLUMNS};
use crate::run_log::{RunKind, RunLogEntry};
use crate::schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Fields a Processor write-back may set. Left `None` to mean "do not
/// touch this field" rather than "clear it". A Stage1 write never zeroes
/// a record's future `stage2_score` column, for instance.
#[derive(Debug, Clone, Default)]
pub struct ScoreUpdate {
    pub stage1_score: Option<f64>,
    pub stage1_reasons: Option<Vec<String>>,
    pub stage2_score: Option<f64>,
    pub final_score: Option<f64>,
    pub extracted_skills: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub total: i64,
    pub by_status: Vec<(String, i64)>,
    pub by_site: Vec<(String, i64)>,
    pub recent_24h: i64,
}

pub struct Store {
    pool: Pool<SqliteConnectionManager>,
}

impl Store {
    /// Open (creating if absent) the SQLite file at `db_path`, applying
    /// the schema bootstrap/migration in `schema.rs` before returning.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;",
            )
        });
        Self::from_manager(manager)
    }

    /// In-memory store for tests: same schema, no file on disk, one
    /// connection shared through the pool (SQLite's `:memory:` databases
    /// are per-connection, so the pool is capped at size 1 here).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(StoreError::Pool)?;
        let conn = pool.get().map_err(StoreError::Pool)?;
        schema::apply_schema(&conn).map_err(StoreError::Query)?;
        Ok(Self { pool })
    }

    fn from_manager(manager: SqliteConnectionManager) -> Result<Self, StoreError> {
        let pool = Pool::builder()
            .max_size(8)
            .build(manager)
            .map_err(StoreError::Pool)?;
        {
            let conn = pool.get().map_err(StoreError::Pool)?;
            schema::apply_schema(&conn).map_err(StoreError::Query)?;
        }
        Ok(Self { pool })
    }

    /// Upsert by fingerprint with field-wise merge. Scoring fields and
    /// `status` are never touched here, only `advance_status` and
    /// `update_scores` mutate them, and `search_keyword` is frozen on
    /// first insert rather than overwritten by a later re-scrape.
    #[instrument(skip(self, record), fields(fingerprint = %record.fingerprint))]
    pub fn upsert(&self, record: &JobRecord) -> Result<UpsertOutcome, StoreError> {
        record
            .validate()
            .map_err(|e| StoreError::Invalid(e.to_string()))?;

        let mut conn = self.pool.get().map_err(StoreError::Pool)?;
        let tx = conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
            .map_err(StoreError::Query)?;

        let existing = tx
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM jobs WHERE fingerprint = ?1"),
                params![record.fingerprint],
                from_row,
            )
            .optional()
            .map_err(StoreError::Query)?;

        let now = Utc::now();
        let outcome = match existing {
            None => {
                insert_row(&tx, record, now)?;
                UpsertOutcome::Inserted
            }
            Some(old) => {
                let merged = merge_record(&old, record, now);
                if records_equal_ignoring_last_seen(&old, &merged) {
                    touch_last_seen(&tx, &record.fingerprint, now)?;
                    UpsertOutcome::Unchanged
                } else {
                    update_row(&tx, &merged)?;
                    UpsertOutcome::Updated
                }
            }
        };

        tx.commit().map_err(StoreError::Query)?;
        debug!(outcome = ?outcome, "upsert complete");
        Ok(outcome)
    }

    /// Compare-and-swap the status column. Fails with `IllegalTransition`
    /// if the current status isn't `from`, including the case where
    /// another process already advanced it, which the Processor treats
    /// as "someone else got there first, skip".
    #[instrument(skip(self))]
    pub fn advance_status(
        &self,
        fingerprint: &str,
        from: Status,
        to: Status,
    ) -> Result<(), StoreError> {
        let mut conn = self.pool.get().map_err(StoreError::Pool)?;
        let tx = conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
            .map_err(StoreError::Query)?;
        cas_status(&tx, fingerprint, from, to, None)?;
        tx.commit().map_err(StoreError::Query)?;
        Ok(())
    }

    /// Write Stage1/Stage2 score fields atomically with the matching
    /// status advance. `from`/`to` pick the CAS boundary: `Scraped ->
    /// Stage1Scored` for a Stage1 write, `Stage1Scored -> Processed` for
    /// a Stage2 write.
    #[instrument(skip(self, update))]
    pub fn update_scores(
        &self,
        fingerprint: &str,
        from: Status,
        to: Status,
        update: ScoreUpdate,
    ) -> Result<(), StoreError> {
        let mut conn = self.pool.get().map_err(StoreError::Pool)?;
        let tx = conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
            .map_err(StoreError::Query)?;
        cas_status(&tx, fingerprint, from, to, Some(&update))?;
        tx.commit().map_err(StoreError::Query)?;
        Ok(())
    }

    /// Snapshot read: may miss concurrently inserted records but never
    /// returns a partially written one, since every writer commits inside
    /// a transaction. Ordered by `last_seen_at desc`, ties broken by
    /// fingerprint for stable pagination.
    pub fn query(&self, filter: &JobFilter) -> Result<Vec<JobRecord>, StoreError> {
        let conn = self.pool.get().map_err(StoreError::Pool)?;
        let mut sql = format!("SELECT {SELECT_COLUMNS} FROM jobs WHERE 1 = 1");
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if !filter.statuses.is_empty() {
            let placeholders: Vec<String> = filter
                .statuses
                .iter()
                .map(|s| {
                    args.push(Box::new(s.as_str().to_string()));
                    format!("?{}", args.len())
                })
                .collect();
            sql.push_str(&format!(" AND status IN ({})", placeholders.join(", ")));
        }
        if let Some(min) = filter.min_score {
            args.push(Box::new(min));
            sql.push_str(&format!(" AND final_score >= ?{}", args.len()));
        }
        if let Some(max) = filter.max_score {
            args.push(Box::new(max));
            sql.push_str(&format!(" AND final_score <= ?{}", args.len()));
        }
        if let Some(site) = &filter.source_site {
            args.push(Box::new(site.clone()));
            sql.push_str(&format!(" AND source_site = ?{}", args.len()));
        }
        if let Some(keyword) = &filter.search_keyword {
            args.push(Box::new(keyword.clone()));
            sql.push_str(&format!(" AND search_keyword = ?{}", args.len()));
        }
        if let Some(since) = filter.since {
            args.push(Box::new(since.to_rfc3339()));
            sql.push_str(&format!(" AND last_seen_at >= ?{}", args.len()));
        }
        sql.push_str(" ORDER BY last_seen_at DESC, fingerprint ASC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut stmt = conn.prepare(&sql).map_err(StoreError::Query)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = args.iter().map(|b| b.as_ref()).collect();
        let rows = stmt
            .query_map(param_refs.as_slice(), from_row)
            .map_err(StoreError::Query)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(StoreError::Query)?);
        }
        Ok(records)
    }

    pub fn get(&self, fingerprint: &str) -> Result<Option<JobRecord>, StoreError> {
        let conn = self.pool.get().map_err(StoreError::Pool)?;
        conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM jobs WHERE fingerprint = ?1"),
            params![fingerprint],
            from_row,
        )
        .optional()
        .map_err(StoreError::Query)
    }

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.pool.get().map_err(StoreError::Pool)?;

        let total: i64 = conn
            .query_row("SELECT COUNT(*) FROM jobs", [], |r| r.get(0))
            .map_err(StoreError::Query)?;

        let by_status = collect_pairs(&conn, "SELECT status, COUNT(*) FROM jobs GROUP BY status")?;
        let by_site =
            collect_pairs(&conn, "SELECT source_site, COUNT(*) FROM jobs GROUP BY source_site")?;

        let since = (Utc::now() - chrono::Duration::hours(24)).to_rfc3339();
        let recent_24h: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM jobs WHERE last_seen_at >= ?1",
                params![since],
                |r| r.get(0),
            )
            .map_err(StoreError::Query)?;

        Ok(StoreStats {
            total,
            by_status,
            by_site,
            recent_24h,
        })
    }

    /// Maintenance operation: reset a posting back to `Scraped`,
    /// preserving its fingerprint and discovery fields but clearing every
    /// processing field so a re-scrape can run the pipeline again.
    pub fn reset_for_rescrape(&self, fingerprint: &str) -> Result<(), StoreError> {
        let conn = self.pool.get().map_err(StoreError::Pool)?;
        let rows = conn
            .execute(
                "UPDATE jobs SET status = 'scraped', stage1_score = NULL, stage1_reasons = '[]', \
                 stage2_score = NULL, final_score = NULL, stage1_at = NULL, stage2_at = NULL, \
                 processed_at = NULL WHERE fingerprint = ?1",
                params![fingerprint],
            )
            .map_err(StoreError::Query)?;
        if rows == 0 {
            return Err(StoreError::NotFound(fingerprint.to_string()));
        }
        Ok(())
    }

    /// Explicit purge. Routine scrape/process runs never call this.
    pub fn purge(&self, fingerprint: &str) -> Result<(), StoreError> {
        let conn = self.pool.get().map_err(StoreError::Pool)?;
        conn.execute("DELETE FROM jobs WHERE fingerprint = ?1", params![fingerprint])
            .map_err(StoreError::Query)?;
        Ok(())
    }

    /// Open a new run-log row for an in-progress Scraper/Processor
    /// invocation; returns its row id for `finish_run`.
    pub fn start_run(&self, kind: RunKind) -> Result<i64, StoreError> {
        let conn = self.pool.get().map_err(StoreError::Pool)?;
        conn.execute(
            "INSERT INTO run_log (kind, started_at, counters_json) VALUES (?1, ?2, '{}')",
            params![kind.as_str(), Utc::now().to_rfc3339()],
        )
        .map_err(StoreError::Query)?;
        Ok(conn.last_insert_rowid())
    }

    /// Close out a run-log row with its final counters: one entry per
    /// Scraper or Processor invocation, carrying start/end times and
    /// counters.
    pub fn finish_run(
        &self,
        run_id: i64,
        counters: &std::collections::HashMap<String, i64>,
    ) -> Result<(), StoreError> {
        let conn = self.pool.get().map_err(StoreError::Pool)?;
        let counters_json =
            serde_json::to_string(counters).map_err(|e| StoreError::Invalid(e.to_string()))?;
        conn.execute(
            "UPDATE run_log SET ended_at = ?1, counters_json = ?2 WHERE id = ?3",
            params![Utc::now().to_rfc3339(), counters_json, run_id],
        )
        .map_err(StoreError::Query)?;
        Ok(())
    }

    pub fn recent_runs(&self, limit: u32) -> Result<Vec<RunLogEntry>, StoreError> {
        let conn = self.pool.get().map_err(StoreError::Pool)?;
        let mut stmt = conn
            .prepare(
                "SELECT id, kind, started_at, ended_at, counters_json FROM run_log \
                 ORDER BY id DESC LIMIT ?1",
            )
            .map_err(StoreError::Query)?;
        let rows = stmt
            .query_map(params![limit], |row| {
                let kind_raw: String = row.get(1)?;
                let counters_raw: String = row.get(4)?;
                Ok(RunLogEntry {
                    id: row.get(0)?,
                    kind: RunKind::parse(&kind_raw).unwrap_or(RunKind::Scrape),
                    started_at: row.get::<_, DateTime<Utc>>(2)?,
                    ended_at: row.get::<_, Option<DateTime<Utc>>>(3)?,
                    counters: serde_json::from_str(&counters_raw).unwrap_or_default(),
                })
            })
            .map_err(StoreError::Query)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(StoreError::Query)?);
        }
        Ok(entries)
    }
}

fn collect_pairs(
    conn: &rusqlite::Connection,
    sql: &str,
) -> Result<Vec<(String, i64)>, StoreError> {
    let mut stmt = conn.prepare(sql).map_err(StoreError::Query)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .map_err(StoreError::Query)?;
    let mut pairs = Vec::new();
    for row in rows {
        pairs.push(row.map_err(StoreError::Query)?);
    }
    Ok(pairs)
}

/// Apply a status CAS inside an already-open transaction, optionally
/// writing score fields in the same statement. `stage1_at`/`stage2_at`/
/// `processed_at` are stamped from the *target* status, keeping the
/// discovery and processing timestamps monotonically ordered.
fn cas_status(
    tx: &rusqlite::Transaction<'_>,
    fingerprint: &str,
    from: Status,
    to: Status,
    update: Option<&ScoreUpdate>,
) -> Result<(), StoreError> {
    let current: Option<String> = tx
        .query_row(
            "SELECT status FROM jobs WHERE fingerprint = ?1",
            params![fingerprint],
            |row| row.get(0),
        )
        .optional()
        .map_err(StoreError::Query)?;

    let current = current.ok_or_else(|| StoreError::NotFound(fingerprint.to_string()))?;
    if current != from.as_str() {
        return Err(StoreError::IllegalTransition {
            expected: from.as_str().to_string(),
            actual: current,
        });
    }

    let now = Utc::now().to_rfc3339();
    let (timestamp_column, timestamp_value): (&str, Option<&str>) = match to {
        Status::Stage1Scored => ("stage1_at", Some(now.as_str())),
        Status::Processed => ("processed_at", Some(now.as_str())),
        Status::Scraped => ("stage1_at", None),
    };

    let mut set_clauses = vec!["status = ?1".to_string()];
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(to.as_str().to_string())];

    if timestamp_value.is_some() {
        args.push(Box::new(now.clone()));
        set_clauses.push(format!("{timestamp_column} = ?{}", args.len()));
        if to == Status::Processed {
            args.push(Box::new(now.clone()));
            set_clauses.push(format!("stage2_at = ?{}", args.len()));
        }
    }

    if let Some(update) = update {
        if let Some(score) = update.stage1_score {
            args.push(Box::new(score));
            set_clauses.push(format!("stage1_score = ?{}", args.len()));
        }
        if let Some(reasons) = &update.stage1_reasons {
            args.push(Box::new(json_list(reasons)));
            set_clauses.push(format!("stage1_reasons = ?{}", args.len()));
        }
        if let Some(score) = update.stage2_score {
            args.push(Box::new(score));
            set_clauses.push(format!("stage2_score = ?{}", args.len()));
        }
        if let Some(score) = update.final_score {
            args.push(Box::new(score));
            set_clauses.push(format!("final_score = ?{}", args.len()));
        }
        if let Some(skills) = &update.extracted_skills {
            args.push(Box::new(json_list(skills)));
            set_clauses.push(format!("extracted_skills = ?{}", args.len()));
        }
        if let Some(requirements) = &update.requirements {
            args.push(Box::new(json_list(requirements)));
            set_clauses.push(format!("requirements = ?{}", args.len()));
        }
    }

    args.push(Box::new(fingerprint.to_string()));
    let fingerprint_param = args.len();
    args.push(Box::new(from.as_str().to_string()));
    let from_param = args.len();

    let sql = format!(
        "UPDATE jobs SET {} WHERE fingerprint = ?{fingerprint_param} AND status = ?{from_param}",
        set_clauses.join(", ")
    );
    let param_refs: Vec<&dyn rusqlite::ToSql> = args.iter().map(|b| b.as_ref()).collect();
    let rows = tx
        .execute(&sql, param_refs.as_slice())
        .map_err(StoreError::Query)?;

    if rows == 0 {
        // Lost the race between the read above and this write.
        return Err(StoreError::IllegalTransition {
            expected: from.as_str().to_string(),
            actual: "concurrently modified".to_string(),
        });
    }
    Ok(())
}

fn insert_row(tx: &rusqlite::Transaction<'_>, record: &JobRecord, now: DateTime<Utc>) -> Result<(), StoreError> {
    tx.execute(
        &format!(
            "INSERT INTO jobs ({SELECT_COLUMNS}) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
              ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28)"
        ),
        params![
            record.fingerprint,
            record.title,
            record.company,
            record.location,
            record.canonical_url,
            record.source_site,
            record.search_keyword,
            record.search_location,
            record.scraped_at.to_rfc3339(),
            record.salary_text,
            record.summary,
            record.description,
            record.job_type,
            record.posted_text,
            record.experience_level,
            json_list(&record.extracted_skills),
            json_list(&record.requirements),
            ats_to_str(record.ats_system),
            record.stage1_score,
            json_list(&record.stage1_reasons),
            record.stage2_score,
            record.final_score,
            record.status.as_str(),
            now.to_rfc3339(),
            record.stage1_at.map(|t| t.to_rfc3339()),
            record.stage2_at.map(|t| t.to_rfc3339()),
            record.processed_at.map(|t| t.to_rfc3339()),
            schema::CURRENT_SCHEMA_VERSION,
        ],
    )
    .map_err(StoreError::Query)?;
    Ok(())
}

fn update_row(tx: &rusqlite::Transaction<'_>, merged: &JobRecord) -> Result<(), StoreError> {
    tx.execute(
        "UPDATE jobs SET title = ?1, company = ?2, location = ?3, canonical_url = ?4, \
         search_location = ?5, salary_text = ?6, summary = ?7, description = ?8, job_type = ?9, \
         posted_text = ?10, experience_level = ?11, extracted_skills = ?12, requirements = ?13, \
         ats_system = ?14, last_seen_at = ?15 WHERE fingerprint = ?16",
        params![
            merged.title,
            merged.company,
            merged.location,
            merged.canonical_url,
            merged.search_location,
            merged.salary_text,
            merged.summary,
            merged.description,
            merged.job_type,
            merged.posted_text,
            merged.experience_level,
            json_list(&merged.extracted_skills),
            json_list(&merged.requirements),
            ats_to_str(merged.ats_system),
            merged.last_seen_at.to_rfc3339(),
            merged.fingerprint,
        ],
    )
    .map_err(StoreError::Query)?;
    Ok(())
}

fn touch_last_seen(tx: &rusqlite::Transaction<'_>, fingerprint: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
    tx.execute(
        "UPDATE jobs SET last_seen_at = ?1 WHERE fingerprint = ?2",
        params![now.to_rfc3339(), fingerprint],
    )
    .map_err(StoreError::Query)?;
    Ok(())
}

fn merge_str(old: &str, new: &str) -> String {
    if new.trim().is_empty() {
        old.to_string()
    } else {
        new.to_string()
    }
}

fn merge_opt(old: &Option<String>, new: &Option<String>) -> Option<String> {
    match new {
        Some(v) if !v.trim().is_empty() => Some(v.clone()),
        _ => old.clone(),
    }
}

fn merge_vec(old: &[String], new: &[String]) -> Vec<String> {
    if new.is_empty() {
        old.to_vec()
    } else {
        new.to_vec()
    }
}

/// Field-wise merge: new non-empty values overwrite old empty values,
/// new empty values never overwrite old non-empty values. Scoring fields
/// and `status` are untouched, carried from `old`, and
/// `search_keyword`/`scraped_at` are frozen from first insert.
fn merge_record(old: &JobRecord, new: &JobRecord, now: DateTime<Utc>) -> JobRecord {
    JobRecord {
        fingerprint: old.fingerprint.clone(),
        title: merge_str(&old.title, &new.title),
        company: merge_str(&old.company, &new.company),
        location: merge_str(&old.location, &new.location),
        canonical_url: merge_str(&old.canonical_url, &new.canonical_url),
        source_site: old.source_site.clone(),
        search_keyword: old.search_keyword.clone(),
        search_location: merge_str(&old.search_location, &new.search_location),
        scraped_at: old.scraped_at,
        salary_text: merge_opt(&old.salary_text, &new.salary_text),
        summary: merge_opt(&old.summary, &new.summary),
        description: merge_opt(&old.description, &new.description),
        job_type: merge_opt(&old.job_type, &new.job_type),
        posted_text: merge_opt(&old.posted_text, &new.posted_text),
        experience_level: merge_opt(&old.experience_level, &new.experience_level),
        extracted_skills: merge_vec(&old.extracted_skills, &new.extracted_skills),
        requirements: merge_vec(&old.requirements, &new.requirements),
        ats_system: if new.ats_system == AtsSystem::Unknown {
            old.ats_system
        } else {
            new.ats_system
        },
        stage1_score: old.stage1_score,
        stage1_reasons: old.stage1_reasons.clone(),
        stage2_score: old.stage2_score,
        final_score: old.final_score,
        status: old.status,
        last_seen_at: now,
        stage1_at: old.stage1_at,
        stage2_at: old.stage2_at,
        processed_at: old.processed_at,
    }
}

fn records_equal_ignoring_last_seen(old: &JobRecord, merged: &JobRecord) -> bool {
    old.title == merged.title
        && old.company == merged.company
        && old.location == merged.location
        && old.canonical_url == merged.canonical_url
        && old.search_location == merged.search_location
        && old.salary_text == merged.salary_text
        && old.summary == merged.summary
        && old.description == merged.description
        && old.job_type == merged.job_type
        && old.posted_text == merged.posted_text
        && old.experience_level == merged.experience_level
        && old.extracted_skills == merged.extracted_skills
        && old.requirements == merged.requirements
        && old.ats_system == merged.ats_system
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_record(fingerprint: &str, keyword: &str) -> JobRecord {
        JobRecord {
            fingerprint: fingerprint.into(),
            title: "Python Developer".into(),
            company: "Example Corp".into(),
            location: "Toronto, ON".into(),
            canonical_url: "https://jobs.examplecorp.com/apply/42".into(),
            source_site: "eluta".into(),
            search_keyword: keyword.into(),
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
            ats_system: AtsSystem::Other,
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
    fn insert_then_reinsert_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let record = sample_record("fp-1", "python developer");

        assert_eq!(store.upsert(&record).unwrap(), UpsertOutcome::Inserted);
        assert_eq!(store.upsert(&record).unwrap(), UpsertOutcome::Unchanged);

        let stored = store.get("fp-1").unwrap().unwrap();
        assert_eq!(stored.fingerprint, "fp-1");
    }

    #[test]
    fn second_keyword_does_not_overwrite_first() {
        let store = Store::open_in_memory().unwrap();
        let first = sample_record("fp-2", "python");
        let mut second = sample_record("fp-2", "developer");
        second.salary_text = Some("$100k".into());

        store.upsert(&first).unwrap();
        let outcome = store.upsert(&second).unwrap();

        assert_eq!(outcome, UpsertOutcome::Updated);
        let stored = store.get("fp-2").unwrap().unwrap();
        assert_eq!(stored.search_keyword, "python");
        assert_eq!(stored.salary_text.as_deref(), Some("$100k"));
    }

    #[test]
    fn empty_new_fields_never_clobber_existing_values() {
        let store = Store::open_in_memory().unwrap();
        let mut first = sample_record("fp-3", "python");
        first.salary_text = Some("$120k".into());
        store.upsert(&first).unwrap();

        let mut second = sample_record("fp-3", "python");
        second.salary_text = None;
        let outcome = store.upsert(&second).unwrap();

        assert_eq!(outcome, UpsertOutcome::Unchanged);
        let stored = store.get("fp-3").unwrap().unwrap();
        assert_eq!(stored.salary_text.as_deref(), Some("$120k"));
    }

    #[test]
    fn advance_status_rejects_wrong_from_state() {
        let store = Store::open_in_memory().unwrap();
        let record = sample_record("fp-4", "python");
        store.upsert(&record).unwrap();

        let err = store
            .advance_status("fp-4", Status::Stage1Scored, Status::Processed)
            .unwrap_err();
        assert!(matches!(err, StoreError::IllegalTransition { .. }));
    }

    #[test]
    fn update_scores_is_atomic_with_status_advance() {
        let store = Store::open_in_memory().unwrap();
        let record = sample_record("fp-5", "python");
        store.upsert(&record).unwrap();

        store
            .update_scores(
                "fp-5",
                Status::Scraped,
                Status::Stage1Scored,
                ScoreUpdate {
                    stage1_score: Some(0.8),
                    stage1_reasons: Some(vec!["title match".into()]),
                    ..Default::default()
                },
            )
            .unwrap();

        let stored = store.get("fp-5").unwrap().unwrap();
        assert_eq!(stored.status, Status::Stage1Scored);
        assert_eq!(stored.stage1_score, Some(0.8));
        assert!(stored.stage1_at.is_some());
    }

    #[test]
    fn query_orders_by_last_seen_desc() {
        let store = Store::open_in_memory().unwrap();
        store.upsert(&sample_record("fp-a", "python")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.upsert(&sample_record("fp-b", "python")).unwrap();

        let results = store.query(&JobFilter::default()).unwrap();
        assert_eq!(results[0].fingerprint, "fp-b");
        assert_eq!(results[1].fingerprint, "fp-a");
    }

    #[test]
    fn run_log_records_start_and_finish() {
        let store = Store::open_in_memory().unwrap();
        let run_id = store.start_run(RunKind::Scrape).unwrap();
        let mut counters = std::collections::HashMap::new();
        counters.insert("inserted".to_string(), 3);
        store.finish_run(run_id, &counters).unwrap();

        let runs = store.recent_runs(5).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].counters.get("inserted"), Some(&3));
        assert!(runs[0].ended_at.is_some());
    }
}
