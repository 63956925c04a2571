//! Schema bootstrap and forward-only migration. `CURRENT_SCHEMA_VERSION`
//! is bumped whenever a migration is appended to `MIGRATIONS`; a store
//! opened against an older on-disk version has the remaining migrations
//! applied once, in order, before any other operation runs.

use rusqlite::Connection;

pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const CREATE_JOBS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS jobs (
        fingerprint TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        company TEXT NOT NULL,
        location TEXT NOT NULL,
        canonical_url TEXT NOT NULL,
        source_site TEXT NOT NULL,
        search_keyword TEXT NOT NULL,
        search_location TEXT NOT NULL,
        scraped_at TEXT NOT NULL,
        salary_text TEXT,
        summary TEXT,
        description TEXT,
        job_type TEXT,
        posted_text TEXT,
        experience_level TEXT,
        extracted_skills TEXT NOT NULL DEFAULT '[]',
        requirements TEXT NOT NULL DEFAULT '[]',
        ats_system TEXT NOT NULL DEFAULT 'unknown',
        stage1_score REAL,
        stage1_reasons TEXT NOT NULL DEFAULT '[]',
        stage2_score REAL,
        final_score REAL,
        status TEXT NOT NULL DEFAULT 'scraped',
        last_seen_at TEXT NOT NULL,
        stage1_at TEXT,
        stage2_at TEXT,
        processed_at TEXT,
        schema_version INTEGER NOT NULL DEFAULT 1
    );
"#;

const CREATE_JOBS_STATUS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);";
const CREATE_JOBS_SITE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_jobs_site ON jobs(source_site);";
const CREATE_JOBS_KEYWORD_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_jobs_keyword ON jobs(search_keyword);";
const CREATE_JOBS_LAST_SEEN_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_jobs_last_seen ON jobs(last_seen_at DESC, fingerprint);";

const CREATE_RUN_LOG_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS run_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind TEXT NOT NULL,
        started_at TEXT NOT NULL,
        ended_at TEXT,
        counters_json TEXT NOT NULL DEFAULT '{}'
    );
"#;

const CREATE_METADATA_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
"#;

/// Migrations beyond v1, appended as the schema evolves. Each closure
/// receives the connection inside the same transaction as the version
/// bump that follows it.
type Migration = fn(&Connection) -> rusqlite::Result<()>;
const MIGRATIONS: &[Migration] = &[];

pub fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    let bootstrap = [
        CREATE_JOBS_TABLE,
        CREATE_JOBS_STATUS_INDEX,
        CREATE_JOBS_SITE_INDEX,
        CREATE_JOBS_KEYWORD_INDEX,
        CREATE_JOBS_LAST_SEEN_INDEX,
        CREATE_RUN_LOG_TABLE,
        CREATE_METADATA_TABLE,
    ]
    .concat();
    conn.execute_batch(&bootstrap)?;

    let stored_version: Option<i64> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| row.get::<_, String>(0),
        )
        .ok()
        .and_then(|v| v.parse().ok());

    let mut version = stored_version.unwrap_or(0);
    for migration in MIGRATIONS.iter().skip(version.max(0) as usize) {
        migration(conn)?;
        version += 1;
    }

    conn.execute(
        "INSERT INTO metadata (key, value) VALUES ('schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}
