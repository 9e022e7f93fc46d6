//! Inbound event dispatch and the per-event handlers.

use std::sync::Arc;
use tracing::{debug, warn};

use super::{AuctionRegistry, NegotiationSide};
use crate::error::AuctionError;
use crate::events::{ClientEvent, ServerEvent};
use crate::ids::{ConnectionId, ProductId};
use crate::traits::{EventTransport, PeerConnectionFactory, ProductCatalog, TimeProvider};

impl<C, P, T, Z> AuctionRegistry<C, P, T, Z>
where
    C: ProductCatalog + 'static,
    P: PeerConnectionFactory + 'static,
    T: EventTransport + 'static,
    Z: TimeProvider + 'static,
{
    /// Entry point for every parsed client event.
    ///
    /// Policy violations and stale-connection races resolve as silent
    /// no-ops or targeted rejection events inside the individual handlers;
    /// nothing here returns an error to the socket layer.
    pub async fn handle_event(self: Arc<Self>, conn: &ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::Identify { user_id } => {
                self.sessions.identify(conn.clone(), user_id);
            }
            ClientEvent::OpenAuction {
                product_id,
                user_id,
            } => {
                if let Err(e) = Arc::clone(&self)
                    .open_auction(&product_id, conn, &user_id)
                    .await
                {
                    warn!(conn = %conn, "open auction failed: {e}");
                }
            }
            ClientEvent::JoinAuction {
                product_id,
                user_id,
            } => {
                if let Err(e) = self.join_as_consumer(&product_id, conn, &user_id).await {
                    self.reject_join(conn, e);
                }
            }
            ClientEvent::Conclusion { product_id, price } => {
                self.submit_bid(&product_id, conn, price).await;
            }
            ClientEvent::SendAskPrice { product_id } => {
                self.submit_ask_price(&product_id, conn).await;
            }
            ClientEvent::SendMessage {
                product_id,
                message,
                user_id,
            } => {
                self.transport.broadcast(
                    &product_id,
                    ServerEvent::ReceiveMessage {
                        user_id: format!("{user_id} : "),
                        message,
                    },
                );
            }
            ClientEvent::SenderOffer { sdp } => {
                self.relay_offer(conn, sdp, NegotiationSide::Producer).await;
            }
            ClientEvent::SenderCandidate { candidate } => {
                self.relay_candidate(conn, candidate).await;
            }
            ClientEvent::ReceiverOffer { sdp } => {
                self.relay_offer(conn, sdp, NegotiationSide::Consumer).await;
            }
            ClientEvent::ReceiverCandidate { candidate } => {
                self.relay_candidate(conn, candidate).await;
            }
            ClientEvent::ForceExit { .. } => {
                let Some(product) = self.sessions.product_of(conn) else {
                    return;
                };
                self.force_exit(&product, conn).await;
            }
            ClientEvent::Close { product_id } => {
                self.handle_producer_close(&product_id, conn).await;
            }
        }
    }

    /// Map a join refusal onto the rejection event the offending connection
    /// expects. Nothing is broadcast; other participants never see it.
    fn reject_join(&self, conn: &ConnectionId, err: AuctionError) {
        match err {
            AuctionError::NotOpen(_) => {
                self.transport.send_to(conn, ServerEvent::DontOpenAuction);
            }
            AuctionError::AlreadyInAuction(other) => {
                self.transport.send_to(
                    conn,
                    ServerEvent::GoUserAuction {
                        other_auction_product_id: other,
                    },
                );
            }
            other => warn!(conn = %conn, "join failed: {other}"),
        }
    }

    /// Explicit bid attempt at a stated price. Attempts for unknown
    /// products, outside the bidding window or below the asking price are
    /// silently dropped.
    pub async fn submit_bid(&self, product: &ProductId, conn: &ConnectionId, price: u64) {
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.get_mut(product) else {
            return;
        };
        if entry.house.submit_bid(conn.clone(), price) {
            debug!(%product, conn = %conn, price, "bid attempt queued");
        }
    }

    /// Bid attempt at whatever the asking price currently is.
    pub async fn submit_ask_price(&self, product: &ProductId, conn: &ConnectionId) {
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.get_mut(product) else {
            return;
        };
        let asking = entry.house.state().asking_price();
        if entry.house.submit_bid(conn.clone(), asking) {
            debug!(%product, conn = %conn, price = asking, "ask-price attempt queued");
        }
    }

    /// Producer disconnect notice. Only the producing connection may close
    /// its own auction this way.
    pub(crate) async fn handle_producer_close(&self, product: &ProductId, conn: &ConnectionId) {
        let is_producer = {
            let entries = self.entries.lock().await;
            entries
                .get(product)
                .is_some_and(|entry| entry.media.producer_conn() == conn)
        };
        if is_producer {
            self.close_auction(product).await;
        }
    }

    /// Transport-level disconnect: drop the connection's directory entry and
    /// whatever auction state it held. A vanished seller closes the whole
    /// auction; a vanished bidder only releases their own participation.
    pub async fn handle_disconnect(self: Arc<Self>, conn: &ConnectionId) {
        let Some(session) = self.sessions.remove(conn) else {
            return;
        };
        let Some(product) = session.product_id else {
            return;
        };

        let seller_gone = {
            let mut entries = self.entries.lock().await;
            match entries.get_mut(&product) {
                None => false,
                Some(entry) if entry.house.seller() == conn => true,
                Some(entry) => {
                    entry.house.leave(conn);
                    if let Some(pc) = entry.media.remove_consumer(conn) {
                        pc.close();
                    }
                    self.transport.leave_room(conn, &product);
                    debug!(%product, conn = %conn, "bidder disconnected");
                    false
                }
            }
        };

        if seller_gone {
            self.close_auction(&product).await;
        }
    }
}
