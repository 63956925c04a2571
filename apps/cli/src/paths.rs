//! Per-profile directory layout (§6 persisted state layout): a profile's
//! JSON snapshot, its SQLite-backed record store, and the directory
//! itself (created on first use so `scrape`/`process` can run against a
//! brand-new profile without a separate init step).

use std::path::{Path, PathBuf};

pub struct ProfilePaths {
    pub dir: PathBuf,
    pub profile_json: PathBuf,
    pub store_db: PathBuf,
}

impl ProfilePaths {
    pub fn resolve(profile_root: &Path, profile_name: &str) -> Self {
        let dir = profile_root.join(profile_name);
        Self {
            profile_json: dir.join("profile.json"),
            store_db: dir.join("store.sqlite3"),
            dir,
        }
    }

    pub fn ensure_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }
}
