//! Per-auction timer tasks: the phase tick and the countdown broadcast.
//!
//! Each open auction runs two independent timers. The phase tick drives the
//! lifecycle and resolves the bid window; the countdown reports remaining
//! time at its own cadence so the UI granularity is decoupled from the
//! resolution granularity. Both stop on the auction's cancellation token.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::AuctionRegistry;
use crate::auction::{LifecycleSignal, Phase, TickOutcome};
use crate::events::ServerEvent;
use crate::ids::{ProductId, UserId};
use crate::traits::{EventTransport, PeerConnectionFactory, ProductCatalog, TimeProvider};

/// Whether the tick loop keeps running after evaluating a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

impl<C, P, T, Z> AuctionRegistry<C, P, T, Z>
where
    C: ProductCatalog + 'static,
    P: PeerConnectionFactory + 'static,
    T: EventTransport + 'static,
    Z: TimeProvider + 'static,
{
    /// Start both timer tasks for a freshly opened auction.
    pub(crate) fn start_auction_tasks(
        self: Arc<Self>,
        product: ProductId,
        token: CancellationToken,
    ) {
        Self::spawn_tick_loop(Arc::clone(&self), product.clone(), token.clone());
        Self::spawn_countdown_loop(self, product, token);
    }

    fn spawn_tick_loop(registry: Arc<Self>, product: ProductId, token: CancellationToken) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(registry.timings.tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick completes immediately; consume it so
            // every bid window spans a full period.
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = token.cancelled() => {
                        debug!(%product, "tick loop cancelled");
                        break;
                    }
                    _ = ticker.tick() => {}
                }

                // One product's tick failing must never reach another
                // product's scheduler; each loop owns its own task and
                // swallows its own panics.
                let control = AssertUnwindSafe(registry.run_tick(&product))
                    .catch_unwind()
                    .await;
                match control {
                    Ok(TickControl::Continue) => {}
                    Ok(TickControl::Stop) => break,
                    Err(panic) => {
                        let message = panic
                            .downcast_ref::<&str>()
                            .map(|s| (*s).to_string())
                            .or_else(|| panic.downcast_ref::<String>().cloned())
                            .unwrap_or_else(|| "non-string panic payload".to_string());
                        error!(%product, panic = %message, "tick evaluation panicked");
                    }
                }
            }
        });
    }

    fn spawn_countdown_loop(registry: Arc<Self>, product: ProductId, token: CancellationToken) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(registry.timings.countdown);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let deadline = {
                    let entries = registry.entries.lock().await;
                    entries.get(&product).map(|entry| entry.deadline_unix)
                };
                let Some(deadline) = deadline else { break };

                let remaining_secs = deadline.saturating_sub(registry.time.now_unix());
                registry
                    .transport
                    .broadcast(&product, ServerEvent::RemainingTime { remaining_secs });
            }
        });
    }

    /// Evaluate one tick for `product`: advance the lifecycle, resolve the
    /// bid window and emit the resulting broadcasts.
    ///
    /// Exposed so tests (and embedders with their own timer source) can
    /// drive ticks deterministically.
    pub async fn run_tick(&self, product: &ProductId) -> TickControl {
        let (signal, outcome, seller, next_price, winner, phase) = {
            let mut entries = self.entries.lock().await;
            let Some(entry) = entries.get_mut(product) else {
                return TickControl::Stop;
            };

            let signal = entry.house.advance_tick();
            let outcome = entry.house.resolve_tick();
            (
                signal,
                outcome,
                entry.house.seller().clone(),
                entry.house.state().asking_price(),
                entry.house.winner().map(|c| c.buyer.clone()),
                entry.house.lifecycle().phase(),
            )
        };

        if matches!(signal, Some(LifecycleSignal::BiddingOpen)) {
            self.transport.broadcast(product, ServerEvent::StartAuction);
        }

        match outcome {
            TickOutcome::NoAction => TickControl::Continue,
            TickOutcome::Concluded(bid) => {
                let status = self.user_label(&bid.bidder);
                info!(%product, bidder = %bid.bidder, price = bid.price, "bid concluded");
                self.transport.broadcast(
                    product,
                    ServerEvent::UpdateAuctionStatus { status, next_price },
                );
                TickControl::Continue
            }
            TickOutcome::Continue => {
                // Steady state keeps re-broadcasting the current standing so
                // late joiners converge; the grace period stays quiet.
                if phase == Phase::Open {
                    let status = winner
                        .map(|buyer| self.user_label(&buyer))
                        .unwrap_or_default();
                    self.transport.broadcast(
                        product,
                        ServerEvent::UpdateAuctionStatus { status, next_price },
                    );
                }
                TickControl::Continue
            }
            TickOutcome::Terminate => {
                let seller_user = UserId::new(self.user_label(&seller));
                info!(%product, "auction expired, tearing down");
                self.transport.broadcast(
                    product,
                    ServerEvent::AuctionExit {
                        user_id: seller_user,
                    },
                );
                self.close_auction(product).await;
                TickControl::Stop
            }
        }
    }
}
