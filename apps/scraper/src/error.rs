use jobscout_domain_models::error::{ErrorKind, HasErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("browser pool fault: {0}")]
    BrowserPool(#[from] jobscout_infra_browser::BrowserPoolError),
    #[error("url resolution fault: {0}")]
    Resolver(#[from] jobscout_infra_resolver::ResolverError),
    #[error("store fault: {0}")]
    Store(#[from] jobscout_infra_store::StoreError),
    #[error("page navigation failed: {0}")]
    Navigation(String),
    #[error("cooperative cancellation observed")]
    Cancelled,
}

impl HasErrorKind for ScraperError {
    fn kind(&self) -> ErrorKind {
        match self {
            ScraperError::BrowserPool(_) | ScraperError::Resolver(_) | ScraperError::Navigation(_) => {
                ErrorKind::Transient
            }
            ScraperError::Store(e) => match e {
                jobscout_infra_store::StoreError::Invalid(_)
                | jobscout_infra_store::StoreError::NotFound(_)
                | jobscout_infra_store::StoreError::IllegalTransition { .. } => ErrorKind::Invalid,
                _ => ErrorKind::Transient,
            },
            ScraperError::Cancelled => ErrorKind::Cancelled,
        }
    }
}
