//! `RunContext` (§9 design notes): the replacement for the "process-wide
//! consoles, global loggers, and module-level singletons" the source
//! relies on. One `RunContext` is built per `scrape`/`process` invocation
//! and threaded explicitly through every worker — it carries the
//! cancellation signal, an optional overall deadline, the shared counter
//! set that feeds a run's Summary, and the `Store` handle both Scraper
//! and Processor write through. No global mutable state survives the
//! rewrite.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use jobscout_infra_store::Store;

/// Shared, thread-safe counter bag. Every `continue`-style skip in the
/// Scraper/Processor bumps a named counter here rather than silently
/// dropping the event (§7: "No error is silently swallowed").
#[derive(Debug, Clone, Default)]
pub struct Counters {
    inner: Arc<Mutex<HashMap<String, i64>>>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self, name: &str) {
        self.bump_by(name, 1);
    }

    pub fn bump_by(&self, name: &str, amount: i64) {
        let mut guard = self.inner.lock().expect("counters mutex poisoned");
        *guard.entry(name.to_string()).or_insert(0) += amount;
    }

    pub fn get(&self, name: &str) -> i64 {
        self.inner.lock().expect("counters mutex poisoned").get(name).copied().unwrap_or(0)
    }

    /// Snapshot for a run-log row or a CLI summary line.
    pub fn snapshot(&self) -> HashMap<String, i64> {
        self.inner.lock().expect("counters mutex poisoned").clone()
    }
}

/// Carries cancellation, a deadline, shared counters, and the `Store`
/// handle through one Scraper or Processor invocation. Cheap to clone —
/// every field is itself `Arc`-backed — so each worker gets its own
/// owned copy instead of a borrow back into a shared owner.
#[derive(Clone)]
pub struct RunContext {
    store: Arc<Store>,
    cancellation: CancellationToken,
    deadline: Option<Instant>,
    counters: Counters,
}

impl RunContext {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            cancellation: CancellationToken::new(),
            deadline: None,
            counters: Counters::new(),
        }
    }

    pub fn with_deadline(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// The token workers select against. Cloned, not borrowed, so a
    /// worker can hold it across an `await` without holding a reference
    /// into `self`.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Request cooperative cancellation of every worker sharing this
    /// context. Workers observe this at card/page boundaries (§5) and
    /// exit cleanly rather than mid-card.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// True once the configured deadline (if any) has passed. Checked
    /// alongside `is_cancelled` at the same worker boundaries; a run with
    /// no deadline never reports this.
    pub fn deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// True if the worker calling this should stop at its next
    /// checkpoint, for either reason.
    pub fn should_stop(&self) -> bool {
        self.is_cancelled() || self.deadline_exceeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_across_clones() {
        let counters = Counters::new();
        let cloned = counters.clone();
        counters.bump("inserted");
        cloned.bump("inserted");
        assert_eq!(counters.get("inserted"), 2);
    }

    #[test]
    fn cancel_is_observed_through_a_cloned_token() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let ctx = RunContext::new(store);
        let token = ctx.cancellation_token();
        assert!(!token.is_cancelled());
        ctx.cancel();
        assert!(token.is_cancelled());
        assert!(ctx.should_stop());
    }

    #[test]
    fn deadline_exceeded_reports_false_with_no_deadline_set() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let ctx = RunContext::new(store);
        assert!(!ctx.deadline_exceeded());
    }

    #[test]
    fn deadline_in_the_past_is_immediately_exceeded() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let ctx = RunContext::new(store).with_deadline(Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert!(ctx.deadline_exceeded());
        assert!(ctx.should_stop());
    }
}
