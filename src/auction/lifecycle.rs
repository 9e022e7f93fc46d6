//! Tick-driven lifecycle state machine for one auction.
//!
//! Phases derive from elapsed ticks against fixed thresholds but are stored
//! explicitly, so the transition table is testable without simulating a
//! timer. All bid attempts queue inside the current tick window and are
//! resolved atomically by [`LifecycleManager::resolve_tick`], which is the
//! crate's substitute for per-bid locking.

use std::time::Duration;
use tracing::debug;

use crate::auction::state::BidAttempt;
use crate::config::Timings;
use crate::ids::ConnectionId;

/// Phase of one auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Seller presents the product; bid attempts are dropped.
    Description,
    /// Bidding is open but silence does not yet close the auction.
    GracePeriod,
    /// Steady state: windows resolve each tick and sustained silence is fatal.
    Open,
    /// A terminating tick was observed; teardown is in flight.
    Concluding,
    /// Fully torn down.
    Closed,
}

/// One-shot signal raised while advancing the tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// The description phase ended; bidding may start. Raised exactly once.
    BiddingOpen,
}

/// Outcome of resolving one tick window.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Still in the description phase.
    NoAction,
    /// The auction must terminate: it is no longer running, or the steady
    /// state saw a full grace window without a single conclusion.
    Terminate,
    /// A winning bid was selected this tick.
    Concluded(BidAttempt),
    /// The window passed without a winner; wait for the next tick.
    Continue,
}

/// Timing policy and pending-bid window of one auction.
pub struct LifecycleManager {
    phase: Phase,
    elapsed_ticks: u32,
    operate_ticks: u32,
    description_ticks: u32,
    grace_deadline_ticks: u32,
    grace_ticks: u32,
    tick: Duration,
    pending: Vec<BidAttempt>,
    /// Consecutive steady-state windows resolved without a conclusion.
    idle_windows: u32,
    bidding_open_raised: bool,
}

impl LifecycleManager {
    pub fn new(operate_time: Duration, timings: &Timings) -> Self {
        Self {
            phase: Phase::Description,
            elapsed_ticks: 0,
            operate_ticks: timings.operate_ticks(operate_time),
            description_ticks: timings.description_ticks(),
            grace_deadline_ticks: timings.grace_deadline_ticks(),
            grace_ticks: timings.grace_ticks(),
            tick: timings.tick,
            pending: Vec::new(),
            idle_windows: 0,
            bidding_open_raised: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elapsed_ticks(&self) -> u32 {
        self.elapsed_ticks
    }

    /// Whether the operating window is still open.
    pub fn is_running(&self) -> bool {
        !matches!(self.phase, Phase::Concluding | Phase::Closed)
            && self.elapsed_ticks < self.operate_ticks
    }

    /// Whether a conclusion may be accepted in the current phase.
    pub fn is_conclusion_due(&self) -> bool {
        matches!(self.phase, Phase::GracePeriod | Phase::Open)
    }

    /// Time until the operating window ends, in whole ticks.
    pub fn remaining_time(&self) -> Duration {
        self.tick
            .saturating_mul(self.operate_ticks.saturating_sub(self.elapsed_ticks))
    }

    /// Advance the tick counter and recompute the phase.
    ///
    /// Raises [`LifecycleSignal::BiddingOpen`] exactly once, on the tick that
    /// crosses the description threshold.
    pub fn advance_tick(&mut self) -> Option<LifecycleSignal> {
        if matches!(self.phase, Phase::Concluding | Phase::Closed) {
            return None;
        }

        self.elapsed_ticks += 1;
        self.phase = if self.elapsed_ticks < self.description_ticks {
            Phase::Description
        } else if self.elapsed_ticks < self.grace_deadline_ticks {
            Phase::GracePeriod
        } else {
            Phase::Open
        };

        if self.elapsed_ticks >= self.description_ticks && !self.bidding_open_raised {
            self.bidding_open_raised = true;
            debug!(tick = self.elapsed_ticks, "bidding window opened");
            return Some(LifecycleSignal::BiddingOpen);
        }
        None
    }

    /// Queue a bid attempt for the current tick window.
    ///
    /// Attempts outside the bidding window, or below the asking price, are
    /// silently dropped. Returns whether the attempt was queued.
    pub fn try_conclusion(&mut self, bidder: ConnectionId, price: u64, asking: u64) -> bool {
        if !self.is_conclusion_due() || price < asking {
            return false;
        }
        self.pending.push(BidAttempt { bidder, price });
        true
    }

    /// Resolve the current tick window. The window is emptied in every case.
    pub fn resolve_tick(&mut self) -> TickOutcome {
        match self.phase {
            Phase::Concluding | Phase::Closed => TickOutcome::Terminate,
            Phase::Description => {
                self.reset_queue();
                TickOutcome::NoAction
            }
            Phase::GracePeriod | Phase::Open => {
                if !self.is_running() {
                    return self.terminate();
                }

                match self.select_winner() {
                    Some(bid) => {
                        self.idle_windows = 0;
                        TickOutcome::Concluded(bid)
                    }
                    None => {
                        if self.phase == Phase::Open {
                            self.idle_windows += 1;
                            if self.idle_windows >= self.grace_ticks {
                                return self.terminate();
                            }
                        }
                        TickOutcome::Continue
                    }
                }
            }
        }
    }

    /// Drop every queued bid attempt so the next window starts empty.
    pub fn reset_queue(&mut self) {
        self.pending.clear();
    }

    /// Final transition once teardown has completed.
    pub fn mark_closed(&mut self) {
        self.phase = Phase::Closed;
    }

    #[cfg(test)]
    pub(crate) fn pending_bids(&self) -> &[BidAttempt] {
        &self.pending
    }

    /// Highest price in the window wins; ties break toward earliest arrival.
    fn select_winner(&mut self) -> Option<BidAttempt> {
        let window = std::mem::take(&mut self.pending);
        let mut winner: Option<BidAttempt> = None;
        for bid in window {
            if winner.as_ref().is_none_or(|best| bid.price > best.price) {
                winner = Some(bid);
            }
        }
        winner
    }

    fn terminate(&mut self) -> TickOutcome {
        self.reset_queue();
        self.phase = Phase::Concluding;
        debug!(tick = self.elapsed_ticks, "lifecycle terminating");
        TickOutcome::Terminate
    }
}
