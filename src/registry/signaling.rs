//! Media signaling relay: producer/consumer peer connections and the
//! offer/answer/candidate plumbing between them and the clients.

use std::sync::Arc;
use tracing::{debug, warn};

use super::AuctionRegistry;
use crate::error::{AuctionError, AuctionResult};
use crate::events::{IceCandidate, ServerEvent, SessionDescription};
use crate::ids::{ConnectionId, ProductId, UserId};
use crate::media::{MediaSession, MediaStream, StreamSlot};
use crate::traits::{
    EventTransport, PeerConnection, PeerConnectionFactory, PeerEventSink, ProductCatalog,
    TimeProvider,
};

/// Which side of the relay a signaling message belongs to. Decides the
/// answer/candidate event names sent back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationSide {
    Producer,
    Consumer,
}

/// Event sink for the seller's producing connection: candidates trickle
/// back to the seller, the first inbound stream fills the session slot.
struct ProducerSink<T: EventTransport> {
    transport: Arc<T>,
    conn: ConnectionId,
    slot: StreamSlot,
}

impl<T: EventTransport> PeerEventSink for ProducerSink<T> {
    fn candidate_produced(&self, candidate: IceCandidate) {
        self.transport
            .send_to(&self.conn, ServerEvent::GetSenderCandidate { candidate });
    }

    fn track_received(&self, stream: MediaStream) {
        if self.slot.fill(stream) {
            debug!(conn = %self.conn, "live stream captured from producer");
        }
    }
}

/// Event sink for a bidder's consuming connection: candidates trickle back
/// to the bidder; consumers never produce tracks.
struct ConsumerSink<T: EventTransport> {
    transport: Arc<T>,
    conn: ConnectionId,
}

impl<T: EventTransport> PeerEventSink for ConsumerSink<T> {
    fn candidate_produced(&self, candidate: IceCandidate) {
        self.transport
            .send_to(&self.conn, ServerEvent::GetReceiverCandidate { candidate });
    }

    fn track_received(&self, stream: MediaStream) {
        debug!(conn = %self.conn, stream = %stream.id, "unexpected track on consumer connection");
    }
}

impl<C, P, T, Z> AuctionRegistry<C, P, T, Z>
where
    C: ProductCatalog + 'static,
    P: PeerConnectionFactory + 'static,
    T: EventTransport + 'static,
    Z: TimeProvider + 'static,
{
    /// Create the seller's producing connection and its media session.
    ///
    /// Duplicate opens never get here: the registry's entry guard refuses
    /// a second producer for the same product before construction.
    pub(crate) fn open_producer(&self, conn: &ConnectionId) -> MediaSession {
        let slot = StreamSlot::new();
        let sink: Arc<dyn PeerEventSink> = Arc::new(ProducerSink {
            transport: Arc::clone(&self.transport),
            conn: conn.clone(),
            slot: slot.clone(),
        });
        let pc = self.peers.create(sink);
        MediaSession::new(conn.clone(), pc, slot)
    }

    /// Register `conn` as a bidder on `product` and fan the live tracks out
    /// to a fresh consuming connection.
    ///
    /// Fails with [`AuctionError::NotOpen`] when no auction is open for the
    /// product and [`AuctionError::AlreadyInAuction`] when the connection
    /// already participates elsewhere; the caller turns those into
    /// rejection events for the offending connection only.
    pub async fn join_as_consumer(
        &self,
        product: &ProductId,
        conn: &ConnectionId,
        user: &UserId,
    ) -> AuctionResult<()> {
        let (seller, status, next_price, roster) = {
            let mut entries = self.entries.lock().await;
            let Some(entry) = entries.get_mut(product) else {
                return Err(AuctionError::NotOpen(product.clone()));
            };

            if let Some(other) = self.sessions.other_auction_of(conn, product) {
                return Err(AuctionError::AlreadyInAuction(other));
            }

            if entry.house.is_participant(conn) {
                debug!(%product, conn = %conn, "duplicate join ignored");
                return Ok(());
            }

            let sink: Arc<dyn PeerEventSink> = Arc::new(ConsumerSink {
                transport: Arc::clone(&self.transport),
                conn: conn.clone(),
            });
            let pc = self.peers.create(sink);

            if let Some(stream) = entry.media.live_stream() {
                for track in &stream.tracks {
                    if let Err(e) = pc.add_track(track.clone(), &stream) {
                        warn!(conn = %conn, "failed to attach live track: {e}");
                    }
                }
            }

            entry.media.add_consumer(conn.clone(), pc);
            entry.house.join(conn.clone());

            (
                entry.house.seller().clone(),
                entry
                    .house
                    .winner()
                    .map(|c| c.buyer.clone())
                    .map(|buyer| self.user_label(&buyer))
                    .unwrap_or_default(),
                entry.house.state().asking_price(),
                entry.house.participant_count(),
            )
        };

        self.sessions
            .bind(conn.clone(), user.clone(), product.clone());
        self.transport.enter_room(conn, product);

        self.transport.send_to(
            conn,
            ServerEvent::CallSeller {
                user_id: UserId::new(self.user_label(&seller)),
            },
        );
        self.transport.broadcast(
            product,
            ServerEvent::JoinUser {
                user_id: user.clone(),
                updated_user_length: roster,
            },
        );
        self.transport.broadcast(
            product,
            ServerEvent::UpdateAuctionStatus {
                status,
                next_price,
            },
        );

        debug!(%product, conn = %conn, "bidder joined");
        Ok(())
    }

    /// Exchange one side's session description: apply the remote offer,
    /// answer it, and store the local description unless one exists.
    ///
    /// A connection with no registered peer connection is a silent no-op —
    /// offers can legitimately race teardown.
    pub async fn relay_offer(
        &self,
        conn: &ConnectionId,
        sdp: SessionDescription,
        side: NegotiationSide,
    ) {
        let Some(pc) = self.peer_for(conn).await else {
            return;
        };

        if let Err(e) = pc.apply_remote_description(sdp).await {
            warn!(conn = %conn, "failed to apply remote description: {e}");
            return;
        }

        let answer = match pc.create_answer().await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(conn = %conn, "failed to create answer: {e}");
                return;
            }
        };

        match pc.apply_local_description(answer.clone()).await {
            Ok(true) => {}
            Ok(false) => debug!(conn = %conn, "local description already set, keeping existing"),
            Err(e) => {
                warn!(conn = %conn, "failed to store local description: {e}");
                return;
            }
        }

        let event = match side {
            NegotiationSide::Producer => ServerEvent::GetSenderAnswer { sdp: answer },
            NegotiationSide::Consumer => ServerEvent::GetReceiverAnswer { sdp: answer },
        };
        self.transport.send_to(conn, event);
    }

    /// Forward a remote ICE candidate to the connection's peer connection.
    /// Missing candidate or missing connection are silent no-ops.
    pub async fn relay_candidate(&self, conn: &ConnectionId, candidate: Option<IceCandidate>) {
        let Some(candidate) = candidate else {
            return;
        };
        let Some(pc) = self.peer_for(conn).await else {
            return;
        };
        if let Err(e) = pc.add_ice_candidate(candidate).await {
            debug!(conn = %conn, "dropping ICE candidate: {e}");
        }
    }

    /// The peer connection registered for `conn` in its current product,
    /// cloned out so callers never await while holding the entries lock.
    async fn peer_for(&self, conn: &ConnectionId) -> Option<Arc<dyn PeerConnection>> {
        let product = self.sessions.product_of(conn)?;
        let entries = self.entries.lock().await;
        entries.get(&product)?.media.connection_for(conn)
    }
}
