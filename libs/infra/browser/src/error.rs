use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserPoolError {
    #[error("no browser context became available within the acquire deadline")]
    AcquireTimeout,
    #[error("pool is shutting down and accepts no further leases")]
    PoolClosed,
    #[error("failed to launch a browser context: {0}")]
    LaunchFailed(String),
    #[error("browser context crashed mid-lease: {0}")]
    ContextCrashed(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
}
