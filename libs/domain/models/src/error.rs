//! Shared error taxonomy. Every component-local error type maps its
//! variants onto one of these kinds so the CLI can pick an exit code
//! without knowing which component failed.

/// Classification of a failure, independent of which component raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input violates a documented contract. Not retried.
    Invalid,
    /// Recoverable I/O, timeout, or conflict. Retried with backoff by the
    /// nearest enclosing component.
    Transient,
    /// A selector or parser no longer matches what it used to. Counted,
    /// never fatal to the run.
    AdapterDrift,
    /// Cooperative cancellation was observed. Not an error per se.
    Cancelled,
}

/// Implemented by every component-local error enum so callers can branch
/// on severity without matching every variant.
pub trait HasErrorKind {
    fn kind(&self) -> ErrorKind;
}
