use jobscout_infra_store::{Store, StoreStats};

use crate::error::CliError;
use crate::paths::ProfilePaths;

pub fn run(paths: &ProfilePaths) -> Result<StoreStats, CliError> {
    let store = Store::open(&paths.store_db)?;
    Ok(store.stats()?)
}
