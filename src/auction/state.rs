//! Pricing ledger for one auction.

use serde::{Deserialize, Serialize};

use crate::ids::ConnectionId;

/// One bid attempt queued inside a tick window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidAttempt {
    pub bidder: ConnectionId,
    pub price: u64,
}

/// Record of the most recently accepted bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conclusion {
    pub buyer: ConnectionId,
    pub price: u64,
}

/// Current pricing state of one auction.
///
/// The asking price only moves through [`AuctionState::conclude`], which adds
/// the fixed increment exactly once, so it is monotonically non-decreasing
/// for the lifetime of the auction.
#[derive(Debug, Clone)]
pub struct AuctionState {
    current_price: u64,
    increment: u64,
    last_conclusion: Option<Conclusion>,
}

impl AuctionState {
    /// New ledger at the product's opening price.
    pub fn new(price: u64, increment: u64) -> Self {
        Self {
            current_price: price,
            increment,
            last_conclusion: None,
        }
    }

    /// Price a bid attempt must meet to be queued this tick.
    pub fn asking_price(&self) -> u64 {
        self.current_price
    }

    pub fn increment(&self) -> u64 {
        self.increment
    }

    pub fn last_conclusion(&self) -> Option<&Conclusion> {
        self.last_conclusion.as_ref()
    }

    /// Accept `bid` as this tick's winner and advance the asking price by
    /// one increment.
    pub fn conclude(&mut self, bid: &BidAttempt) {
        self.last_conclusion = Some(Conclusion {
            buyer: bid.bidder.clone(),
            price: bid.price,
        });
        self.current_price = self.current_price.saturating_add(self.increment);
    }
}
