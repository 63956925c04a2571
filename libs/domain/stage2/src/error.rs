use jobscout_domain_models::error::{ErrorKind, HasErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Stage2Error {
    /// Model server unavailable or rate-limited. The Processor treats this
    /// as "Stage2 skipped", not a run failure.
    #[error("stage2 backend unavailable: {0}")]
    Transient(String),
    /// The backend responded but its output didn't parse into a score —
    /// the semantic-stage analogue of selector rot.
    #[error("stage2 backend returned unparseable output: {0}")]
    MalformedOutput(String),
}

impl HasErrorKind for Stage2Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Stage2Error::Transient(_) => ErrorKind::Transient,
            Stage2Error::MalformedOutput(_) => ErrorKind::AdapterDrift,
        }
    }
}
