use jobscout_domain_models::error::{ErrorKind, HasErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// No selector in the priority list matched on a page previously known
    /// to have cards. The main symptom of upstream HTML change.
    #[error("site {site} yielded zero job cards on a known-good page")]
    Drift { site: &'static str },
    #[error("card on {site} is missing a required field: {field}")]
    MissingRequiredField { site: &'static str, field: &'static str },
    #[error("malformed document: {0}")]
    Malformed(&'static str),
}

impl HasErrorKind for AdapterError {
    fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::Drift { .. } => ErrorKind::AdapterDrift,
            AdapterError::MissingRequiredField { .. } => ErrorKind::Invalid,
            AdapterError::Malformed(_) => ErrorKind::AdapterDrift,
        }
    }
}
