use jobscout_domain_models::error::{ErrorKind, HasErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("store fault: {0}")]
    Store(#[from] jobscout_infra_store::StoreError),
    #[error("cooperative cancellation observed")]
    Cancelled,
}

impl HasErrorKind for ProcessorError {
    fn kind(&self) -> ErrorKind {
        match self {
            ProcessorError::Store(e) => match e {
                jobscout_infra_store::StoreError::Invalid(_)
                | jobscout_infra_store::StoreError::NotFound(_)
                | jobscout_infra_store::StoreError::IllegalTransition { .. } => ErrorKind::Invalid,
                _ => ErrorKind::Transient,
            },
            ProcessorError::Cancelled => ErrorKind::Cancelled,
        }
    }
}
