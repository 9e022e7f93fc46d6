//! Time provider abstraction for testable time-dependent code.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current Unix timestamp.
///
/// The countdown broadcaster measures auction deadlines against this clock;
/// injecting it keeps deadline arithmetic deterministic under test.
pub trait TimeProvider: Send + Sync {
    /// Current Unix timestamp in seconds.
    fn now_unix(&self) -> u64;
}

/// Production implementation backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl SystemTimeProvider {
    pub const fn new() -> Self {
        Self
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
