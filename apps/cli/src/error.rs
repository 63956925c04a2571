//! Umbrella error the CLI maps to an exit code (§6 exit codes table).
//! Every component-local error implements `HasErrorKind`; this just
//! carries that kind forward for whichever step first failed outside a
//! `Summary`-reporting component (profile loading, store open).

use jobscout_domain_models::error::{ErrorKind, HasErrorKind};
use jobscout_domain_models::profile::ProfileError;
use jobscout_infra_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("profile error: {0}")]
    Profile(#[from] ProfileError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("profile {0:?} not found under the profile root")]
    ProfileNotFound(String),
}

impl HasErrorKind for CliError {
    fn kind(&self) -> ErrorKind {
        match self {
            CliError::Profile(e) => e.kind(),
            CliError::Store(e) => e.kind(),
            CliError::ProfileNotFound(_) => ErrorKind::Invalid,
        }
    }
}

/// §6 exit codes: 0 success, 2 invalid input, 3 profile not found, 4 core
/// drift detected, 5 transient infrastructure failure after retries,
/// 1 everything else.
pub fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::ProfileNotFound(_) => 3,
        _ => match err.kind() {
            ErrorKind::Invalid => 2,
            ErrorKind::Transient => 5,
            ErrorKind::AdapterDrift => 4,
            ErrorKind::Cancelled => 1,
        },
    }
}
