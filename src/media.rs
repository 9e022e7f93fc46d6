//! Live media state for one auction.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::ids::ConnectionId;
use crate::traits::PeerConnection;

/// Opaque handle to one live media track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTrack {
    pub id: String,
}

impl MediaTrack {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Opaque handle to the seller's live stream and its tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStream {
    pub id: String,
    pub tracks: Vec<MediaTrack>,
}

/// Shared slot the producer's inbound-track event fills exactly once.
///
/// The slot is shared between the [`MediaSession`] and the producer's event
/// sink; the first remote stream wins and later arrivals are ignored.
#[derive(Clone, Default)]
pub struct StreamSlot {
    inner: Arc<Mutex<Option<MediaStream>>>,
}

impl StreamSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `stream` unless a stream is already present. Returns whether
    /// the slot was filled by this call.
    pub fn fill(&self, stream: MediaStream) -> bool {
        let mut slot = self.inner.lock();
        if slot.is_some() {
            debug!(stream = %stream.id, "ignoring extra inbound stream");
            return false;
        }
        *slot = Some(stream);
        true
    }

    pub fn get(&self) -> Option<MediaStream> {
        self.inner.lock().clone()
    }

    pub fn is_filled(&self) -> bool {
        self.inner.lock().is_some()
    }
}

/// Media relay state for one auction.
///
/// The producer connection lives exactly as long as the auction; each
/// consumer entry lives as long as that bidder's participation.
pub struct MediaSession {
    producer_conn: ConnectionId,
    producer: Arc<dyn PeerConnection>,
    live_stream: StreamSlot,
    consumers: HashMap<ConnectionId, Arc<dyn PeerConnection>>,
}

impl MediaSession {
    pub fn new(
        producer_conn: ConnectionId,
        producer: Arc<dyn PeerConnection>,
        live_stream: StreamSlot,
    ) -> Self {
        Self {
            producer_conn,
            producer,
            live_stream,
            consumers: HashMap::new(),
        }
    }

    pub fn producer_conn(&self) -> &ConnectionId {
        &self.producer_conn
    }

    /// The seller's live stream, once the first inbound track has arrived.
    pub fn live_stream(&self) -> Option<MediaStream> {
        self.live_stream.get()
    }

    pub fn add_consumer(&mut self, conn: ConnectionId, pc: Arc<dyn PeerConnection>) {
        self.consumers.insert(conn, pc);
    }

    pub fn remove_consumer(&mut self, conn: &ConnectionId) -> Option<Arc<dyn PeerConnection>> {
        self.consumers.remove(conn)
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// Peer connection registered for `conn`, whether producer or consumer.
    pub fn connection_for(&self, conn: &ConnectionId) -> Option<Arc<dyn PeerConnection>> {
        if *conn == self.producer_conn {
            return Some(Arc::clone(&self.producer));
        }
        self.consumers.get(conn).cloned()
    }

    /// Close every peer connection of this session. Closing is idempotent,
    /// so a half-initialized session tears down the same way.
    pub fn close_all(&mut self) {
        self.producer.close();
        for (_, pc) in self.consumers.drain() {
            pc.close();
        }
    }
}
