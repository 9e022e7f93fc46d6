//! Real-time live-auction orchestration.
//!
//! Runs many concurrent, time-boxed auctions, each streaming live media
//! from a seller to its bidders. Competing bid attempts queue inside a
//! fixed tick window and are resolved into a single winner per tick, which
//! substitutes a deterministic periodic comparison for per-bid locking.
//! The websocket server, the product database and the WebRTC stack are
//! external collaborators reached through the traits in [`traits`].

pub mod auction;
pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod media;
pub mod registry;
pub mod session;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod mocks;

pub use auction::{
    AuctionHouse, AuctionState, BidAttempt, Conclusion, LifecycleManager, LifecycleSignal, Phase,
    TickOutcome,
};
pub use config::Timings;
pub use error::{AuctionError, AuctionResult};
pub use events::{ClientEvent, IceCandidate, ServerEvent, SessionDescription};
pub use ids::{ConnectionId, ProductId, UserId};
pub use media::{MediaSession, MediaStream, MediaTrack, StreamSlot};
pub use registry::{AuctionRegistry, NegotiationSide, TickControl};
pub use session::{SessionDirectory, SessionEntry};
pub use traits::{
    EventTransport, PeerConnection, PeerConnectionFactory, PeerEventSink, ProductCatalog,
    ProductTerms, SystemTimeProvider, TimeProvider,
};
