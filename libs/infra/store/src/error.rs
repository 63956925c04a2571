use jobscout_domain_models::error::{ErrorKind, HasErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection failed: {0}")]
    Connection(String),
    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),
    #[error("connection pool exhausted or poisoned: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("record failed validation: {0}")]
    Invalid(String),
    #[error("no record with fingerprint {0}")]
    NotFound(String),
    #[error("expected status {expected}, found {actual}")]
    IllegalTransition { expected: String, actual: String },
}

impl HasErrorKind for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Connection(_) | StoreError::Query(_) | StoreError::Pool(_) => {
                ErrorKind::Transient
            }
            StoreError::Invalid(_) | StoreError::NotFound(_) | StoreError::IllegalTransition { .. } => {
                ErrorKind::Invalid
            }
        }
    }
}
