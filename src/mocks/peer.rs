//! Mock peer connections for testing the signaling relay.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::AuctionResult;
use crate::events::{IceCandidate, SessionDescription};
use crate::media::{MediaStream, MediaTrack};
use crate::traits::{PeerConnection, PeerConnectionFactory, PeerEventSink};

/// Scripted peer connection recording every signaling operation.
pub struct MockPeerConnection {
    id: u64,
    remote_description: Mutex<Option<SessionDescription>>,
    local_description: Mutex<Option<SessionDescription>>,
    candidates: Mutex<Vec<IceCandidate>>,
    tracks: Mutex<Vec<MediaTrack>>,
    closed: AtomicBool,
}

impl MockPeerConnection {
    fn new(id: u64) -> Self {
        Self {
            id,
            remote_description: Mutex::new(None),
            local_description: Mutex::new(None),
            candidates: Mutex::new(Vec::new()),
            tracks: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn remote_description(&self) -> Option<SessionDescription> {
        self.remote_description.lock().clone()
    }

    pub fn local_description(&self) -> Option<SessionDescription> {
        self.local_description.lock().clone()
    }

    pub fn received_candidates(&self) -> Vec<IceCandidate> {
        self.candidates.lock().clone()
    }

    pub fn attached_tracks(&self) -> Vec<MediaTrack> {
        self.tracks.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PeerConnection for MockPeerConnection {
    async fn apply_remote_description(&self, sdp: SessionDescription) -> AuctionResult<()> {
        *self.remote_description.lock() = Some(sdp);
        Ok(())
    }

    async fn create_answer(&self) -> AuctionResult<SessionDescription> {
        // Suspend once so tests exercise the interleaving window the real
        // negotiation handshake opens.
        tokio::task::yield_now().await;
        Ok(SessionDescription::answer(format!("mock-answer-{}", self.id)))
    }

    async fn apply_local_description(&self, sdp: SessionDescription) -> AuctionResult<bool> {
        let mut local = self.local_description.lock();
        if local.is_some() {
            return Ok(false);
        }
        *local = Some(sdp);
        Ok(true)
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> AuctionResult<()> {
        self.candidates.lock().push(candidate);
        Ok(())
    }

    fn add_track(&self, track: MediaTrack, _stream: &MediaStream) -> AuctionResult<()> {
        self.tracks.lock().push(track);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Factory handing out [`MockPeerConnection`]s and retaining both the
/// connections and their event sinks, so tests can inspect negotiation
/// state and fire candidate/track events the way the RTC stack would.
#[derive(Default, Clone)]
pub struct MockPeerFactory {
    next_id: Arc<AtomicU64>,
    created: Arc<Mutex<Vec<Arc<MockPeerConnection>>>>,
    sinks: Arc<Mutex<Vec<Arc<dyn PeerEventSink>>>>,
}

impl MockPeerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }

    /// The `index`-th connection created, in creation order.
    pub fn connection(&self, index: usize) -> Arc<MockPeerConnection> {
        Arc::clone(&self.created.lock()[index])
    }

    /// The event sink wired to the `index`-th connection.
    pub fn sink(&self, index: usize) -> Arc<dyn PeerEventSink> {
        Arc::clone(&self.sinks.lock()[index])
    }
}

impl PeerConnectionFactory for MockPeerFactory {
    fn create(&self, events: Arc<dyn PeerEventSink>) -> Arc<dyn PeerConnection> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let pc = Arc::new(MockPeerConnection::new(id));
        self.created.lock().push(Arc::clone(&pc));
        self.sinks.lock().push(events);
        pc
    }
}
