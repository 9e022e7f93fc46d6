//! Peer-connection abstraction for the media relay.
//!
//! The low-level WebRTC stack is an opaque capability: it yields local ICE
//! candidates and inbound media tracks through a [`PeerEventSink`], and
//! accepts the negotiation operations below. Auction logic never touches
//! negotiation plumbing directly.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::AuctionResult;
use crate::events::{IceCandidate, SessionDescription};
use crate::media::{MediaStream, MediaTrack};

/// Sink consuming events produced by one peer connection.
pub trait PeerEventSink: Send + Sync {
    /// A local ICE candidate was gathered and should be trickled to the client.
    fn candidate_produced(&self, candidate: IceCandidate);

    /// A remote media stream arrived on this connection.
    fn track_received(&self, stream: MediaStream);
}

/// One server-side peer connection.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Apply the remote session description.
    async fn apply_remote_description(&self, sdp: SessionDescription) -> AuctionResult<()>;

    /// Run the answer half of the negotiation handshake.
    ///
    /// This is the only suspending signaling operation; callers must not
    /// hold shared registry state across it.
    async fn create_answer(&self) -> AuctionResult<SessionDescription>;

    /// Store the local description unless one is already set.
    ///
    /// Returns `false` when a description was present; the check-and-set is
    /// atomic so duplicate answer events cannot overwrite negotiation state.
    async fn apply_local_description(&self, sdp: SessionDescription) -> AuctionResult<bool>;

    /// Add a remote ICE candidate.
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> AuctionResult<()>;

    /// Attach one of the producer's live tracks for fan-out to a consumer.
    fn add_track(&self, track: MediaTrack, stream: &MediaStream) -> AuctionResult<()>;

    /// Release transport resources. Idempotent.
    fn close(&self);
}

/// Factory yielding peer connections wired to an event sink.
pub trait PeerConnectionFactory: Send + Sync {
    fn create(&self, events: Arc<dyn PeerEventSink>) -> Arc<dyn PeerConnection>;
}
