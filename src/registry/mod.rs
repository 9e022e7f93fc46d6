//! Process-wide auction registry and orchestrator.
//!
//! [`AuctionRegistry`] owns one entry per product — the auction house, the
//! media-relay session and the timers' cancellation token live together, so
//! teardown is a single atomic removal. All socket handlers and the per-
//! product tick task funnel through the registry; entries for one product
//! are never touched by another product's events.
//!
//! # Lock ordering
//!
//! `entries` is the only async lock. It is never held across a negotiation
//! await: peer-connection handles are cloned out first. The session
//! directory uses a sync lock internally and may be read while `entries` is
//! held, never the other way around.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auction::{AuctionHouse, AuctionState, LifecycleManager};
use crate::config::Timings;
use crate::error::{AuctionError, AuctionResult};
use crate::events::ServerEvent;
use crate::ids::{ConnectionId, ProductId, UserId};
use crate::media::MediaSession;
use crate::session::SessionDirectory;
use crate::traits::{EventTransport, PeerConnectionFactory, ProductCatalog, TimeProvider};

mod handlers;
mod scheduler;
mod signaling;

pub use scheduler::TickControl;
pub use signaling::NegotiationSide;

/// Everything one product's auction owns, torn down as a unit.
pub(crate) struct ProductEntry {
    pub(crate) house: AuctionHouse,
    pub(crate) media: MediaSession,
    /// Cancels the tick and countdown tasks for this auction.
    pub(crate) shutdown: CancellationToken,
    /// Unix deadline the countdown broadcaster reports against.
    pub(crate) deadline_unix: u64,
}

/// Process-wide table of running auctions plus the collaborators every
/// auction needs: product lookup, peer-connection factory, outbound
/// transport and the clock.
pub struct AuctionRegistry<C, P, T, Z>
where
    C: ProductCatalog,
    P: PeerConnectionFactory,
    T: EventTransport,
    Z: TimeProvider,
{
    pub(crate) catalog: C,
    pub(crate) peers: P,
    pub(crate) transport: Arc<T>,
    pub(crate) time: Z,
    pub(crate) timings: Timings,
    pub(crate) entries: Mutex<HashMap<ProductId, ProductEntry>>,
    pub(crate) sessions: SessionDirectory,
    /// Parent token; every auction's token is a child of it.
    pub(crate) shutdown: CancellationToken,
}

impl<C, P, T, Z> AuctionRegistry<C, P, T, Z>
where
    C: ProductCatalog + 'static,
    P: PeerConnectionFactory + 'static,
    T: EventTransport + 'static,
    Z: TimeProvider + 'static,
{
    pub fn new(catalog: C, peers: P, transport: T, time: Z, timings: Timings) -> Self {
        Self {
            catalog,
            peers,
            transport: Arc::new(transport),
            time,
            timings,
            entries: Mutex::new(HashMap::new()),
            sessions: SessionDirectory::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn sessions(&self) -> &SessionDirectory {
        &self.sessions
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// Cancel every auction's timers and the registry itself.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Whether an auction is currently registered for `product`.
    pub async fn is_open(&self, product: &ProductId) -> bool {
        self.entries.lock().await.contains_key(product)
    }

    /// Number of registered participants for `product`, if open.
    pub async fn participant_count(&self, product: &ProductId) -> Option<usize> {
        let entries = self.entries.lock().await;
        entries.get(product).map(|e| e.house.participant_count())
    }

    /// Start an auction for `product` with `conn` as the seller.
    ///
    /// A second open for the same product is a silent no-op. A failed
    /// product lookup aborts cleanly — the seller gets `dontOpenAuction`
    /// and no partial state is left behind.
    pub async fn open_auction(
        self: Arc<Self>,
        product: &ProductId,
        conn: &ConnectionId,
        user: &UserId,
    ) -> AuctionResult<()> {
        if self.is_open(product).await {
            debug!(%product, "auction already open, ignoring duplicate open");
            return Ok(());
        }

        let terms = match self.catalog.terms_for(product).await {
            Ok(terms) => terms,
            Err(e) => {
                self.transport.send_to(conn, ServerEvent::DontOpenAuction);
                return Err(AuctionError::Catalog(format!(
                    "aborting open of {product}: {e}"
                )));
            }
        };

        let mut media = self.open_producer(conn);
        let state = AuctionState::new(terms.price, terms.per_price);
        let lifecycle = LifecycleManager::new(terms.operate_time, &self.timings);
        let house = AuctionHouse::new(conn.clone(), state, lifecycle);
        let token = self.shutdown.child_token();
        let deadline_unix = self.time.now_unix() + terms.operate_time.as_secs();

        {
            let mut entries = self.entries.lock().await;
            // The catalog lookup suspended; a racing open may have won.
            if entries.contains_key(product) {
                debug!(%product, "auction appeared during lookup, ignoring duplicate open");
                media.close_all();
                return Ok(());
            }
            entries.insert(
                product.clone(),
                ProductEntry {
                    house,
                    media,
                    shutdown: token.clone(),
                    deadline_unix,
                },
            );
        }

        self.sessions.bind(conn.clone(), user.clone(), product.clone());
        self.transport.enter_room(conn, product);

        self.transport.broadcast(
            product,
            ServerEvent::UpdateAuctionStatus {
                status: String::new(),
                next_price: terms.price,
            },
        );
        self.transport.broadcast(
            product,
            ServerEvent::CallSeller {
                user_id: user.clone(),
            },
        );
        self.transport.broadcast(
            product,
            ServerEvent::JoinUser {
                user_id: user.clone(),
                updated_user_length: 1,
            },
        );
        self.transport.broadcast(
            product,
            ServerEvent::AuctionStart {
                user_id: user.clone(),
            },
        );

        Arc::clone(&self).start_auction_tasks(product.clone(), token);
        info!(%product, seller = %conn, "auction opened");
        Ok(())
    }

    /// Tear down the auction for `product`.
    ///
    /// Idempotent and safe on a half-initialized auction: the entry is
    /// removed atomically, the timers are cancelled, every peer connection
    /// is closed and every participant's directory association and room
    /// membership is cleared. Each step runs even if an earlier one had
    /// nothing to do.
    pub async fn close_auction(&self, product: &ProductId) {
        let entry = self.entries.lock().await.remove(product);
        let Some(mut entry) = entry else {
            debug!(%product, "close requested for unknown auction");
            return;
        };

        entry.shutdown.cancel();
        entry.house.mark_closed();
        entry.media.close_all();

        for conn in entry.house.participants() {
            self.sessions.clear_product(conn);
            self.transport.leave_room(conn, product);
        }

        info!(%product, "auction closed");
    }

    /// Seller-only abort. Notifies every participant except the seller and
    /// the already-determined winner, then closes the auction.
    pub async fn force_exit(&self, product: &ProductId, requester: &ConnectionId) {
        let notify: Vec<ConnectionId> = {
            let entries = self.entries.lock().await;
            let Some(entry) = entries.get(product) else {
                return;
            };
            if entry.house.seller() != requester {
                warn!(%product, conn = %requester, "force exit refused: not the seller");
                return;
            }
            let winner = entry.house.winner().map(|c| c.buyer.clone());
            entry
                .house
                .participants()
                .filter(|c| *c != requester && Some(*c) != winner.as_ref())
                .cloned()
                .collect()
        };

        for conn in &notify {
            self.transport.send_to(conn, ServerEvent::ForceAuctionExit);
        }
        info!(%product, notified = notify.len(), "auction force-exited by seller");
        self.close_auction(product).await;
    }

    /// User label for a connection: its user id, or empty when unknown.
    /// Status broadcasts carry this the way the client expects.
    pub(crate) fn user_label(&self, conn: &ConnectionId) -> String {
        self.sessions
            .user_of(conn)
            .map(|user| user.0)
            .unwrap_or_default()
    }
}
