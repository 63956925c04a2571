use thiserror::Error;

/// Unrecoverable faults propagate; everything else resolves to an empty
/// canonical URL with a counter bump (§4.C: "returns empty string rather
/// than raising for recoverable cases").
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("browser pool fault: {0}")]
    BrowserPool(#[from] jobscout_infra_browser::BrowserPoolError),
}
