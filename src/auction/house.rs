//! One auction: pricing state, lifecycle and the participant roster.

use std::collections::HashSet;

use super::lifecycle::{LifecycleManager, LifecycleSignal, Phase, TickOutcome};
use super::state::{AuctionState, Conclusion};
use crate::ids::ConnectionId;

/// Aggregate of everything one product's auction owns besides media.
///
/// Owned exclusively by the registry entry for its product; only that
/// product's tick task and socket handlers ever touch it.
pub struct AuctionHouse {
    seller: ConnectionId,
    state: AuctionState,
    lifecycle: LifecycleManager,
    participants: HashSet<ConnectionId>,
}

impl AuctionHouse {
    pub fn new(seller: ConnectionId, state: AuctionState, lifecycle: LifecycleManager) -> Self {
        let mut participants = HashSet::new();
        participants.insert(seller.clone());
        Self {
            seller,
            state,
            lifecycle,
            participants,
        }
    }

    pub fn seller(&self) -> &ConnectionId {
        &self.seller
    }

    /// Add a participant. Idempotent; silently refused once the auction is
    /// winding down.
    pub fn join(&mut self, conn: ConnectionId) -> bool {
        if matches!(self.lifecycle.phase(), Phase::Concluding | Phase::Closed) {
            return false;
        }
        self.participants.insert(conn)
    }

    pub fn leave(&mut self, conn: &ConnectionId) -> bool {
        self.participants.remove(conn)
    }

    pub fn is_participant(&self, conn: &ConnectionId) -> bool {
        self.participants.contains(conn)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn participants(&self) -> impl Iterator<Item = &ConnectionId> {
        self.participants.iter()
    }

    /// Queue a bid attempt against the current asking price.
    pub fn submit_bid(&mut self, bidder: ConnectionId, price: u64) -> bool {
        let asking = self.state.asking_price();
        self.lifecycle.try_conclusion(bidder, price, asking)
    }

    pub fn advance_tick(&mut self) -> Option<LifecycleSignal> {
        self.lifecycle.advance_tick()
    }

    /// Resolve the tick window, applying a conclusion to the ledger.
    pub fn resolve_tick(&mut self) -> TickOutcome {
        let outcome = self.lifecycle.resolve_tick();
        if let TickOutcome::Concluded(bid) = &outcome {
            self.state.conclude(bid);
        }
        outcome
    }

    pub fn winner(&self) -> Option<&Conclusion> {
        self.state.last_conclusion()
    }

    pub fn state(&self) -> &AuctionState {
        &self.state
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn mark_closed(&mut self) {
        self.lifecycle.mark_closed();
    }
}
