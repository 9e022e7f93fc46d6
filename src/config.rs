//! Timing configuration for auction scheduling.
//!
//! This module centralizes the timing constants and exposes them through
//! [`Timings`] so the tick period, phase thresholds and countdown cadence
//! are never hard-coded at use sites. Every value can be overridden through
//! an environment variable, which lets tests and staging run compressed
//! auctions.

use std::time::Duration;

/// Default period of one bid-resolution tick.
pub const DEFAULT_TICK_MS: u64 = 5_000;

/// Default length of the seller's description phase.
pub const DEFAULT_DESCRIPTION_MS: u64 = 60_000;

/// Default end of the no-bid grace window, measured from auction open.
pub const DEFAULT_GRACE_DEADLINE_MS: u64 = DEFAULT_DESCRIPTION_MS + 10_000;

/// Default period of the participant-facing countdown broadcast.
pub const DEFAULT_COUNTDOWN_MS: u64 = 1_000;

/// Environment variable overriding the tick period (milliseconds).
pub const TICK_MS_ENV: &str = "AUCTION_TICK_MS";

/// Environment variable overriding the description phase (milliseconds).
pub const DESCRIPTION_MS_ENV: &str = "AUCTION_DESCRIPTION_MS";

/// Environment variable overriding the grace deadline (milliseconds).
pub const GRACE_DEADLINE_MS_ENV: &str = "AUCTION_GRACE_DEADLINE_MS";

/// Environment variable overriding the countdown period (milliseconds).
pub const COUNTDOWN_MS_ENV: &str = "AUCTION_COUNTDOWN_MS";

/// Timing policy shared by every auction a registry starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Period of one bid-resolution tick.
    pub tick: Duration,
    /// Length of the description phase; bidding opens when it ends.
    pub description: Duration,
    /// Point after which an auction must keep concluding bids to stay alive.
    pub grace_deadline: Duration,
    /// Period of the countdown broadcast to participants.
    pub countdown: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            description: Duration::from_millis(DEFAULT_DESCRIPTION_MS),
            grace_deadline: Duration::from_millis(DEFAULT_GRACE_DEADLINE_MS),
            countdown: Duration::from_millis(DEFAULT_COUNTDOWN_MS),
        }
    }
}

impl Timings {
    /// Build timings from the environment, falling back to the defaults for
    /// any variable that is unset or unparsable.
    pub fn from_env() -> Self {
        Self {
            tick: Duration::from_millis(env_ms(TICK_MS_ENV, DEFAULT_TICK_MS)),
            description: Duration::from_millis(env_ms(DESCRIPTION_MS_ENV, DEFAULT_DESCRIPTION_MS)),
            grace_deadline: Duration::from_millis(env_ms(
                GRACE_DEADLINE_MS_ENV,
                DEFAULT_GRACE_DEADLINE_MS,
            )),
            countdown: Duration::from_millis(env_ms(COUNTDOWN_MS_ENV, DEFAULT_COUNTDOWN_MS)),
        }
    }

    /// Number of ticks spent in the description phase.
    pub fn description_ticks(&self) -> u32 {
        ceil_ticks(self.description, self.tick)
    }

    /// Tick index at which the grace window ends and the steady state begins.
    pub fn grace_deadline_ticks(&self) -> u32 {
        ceil_ticks(self.grace_deadline, self.tick)
    }

    /// Width of the grace window in ticks (at least one).
    pub fn grace_ticks(&self) -> u32 {
        self.grace_deadline_ticks()
            .saturating_sub(self.description_ticks())
            .max(1)
    }

    /// Number of ticks an auction with the given operating time runs for.
    pub fn operate_ticks(&self, operate: Duration) -> u32 {
        ceil_ticks(operate, self.tick)
    }
}

fn env_ms(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default)
}

fn ceil_ticks(span: Duration, tick: Duration) -> u32 {
    let tick_ms = tick.as_millis().max(1);
    let span_ms = span.as_millis();
    (span_ms.div_ceil(tick_ms)).min(u128::from(u32::MAX)) as u32
}
