//! Mock time provider for testing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::traits::TimeProvider;

/// Controllable clock. Clones share the same underlying instant, so the
/// harness and the components under test always agree on the time.
#[derive(Debug, Clone)]
pub struct MockTime {
    now: Arc<AtomicU64>,
}

impl MockTime {
    pub fn new(initial: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(initial)),
        }
    }

    pub fn set(&self, timestamp: u64) {
        self.now.store(timestamp, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Default for MockTime {
    fn default() -> Self {
        Self::new(1_000)
    }
}

impl TimeProvider for MockTime {
    fn now_unix(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
