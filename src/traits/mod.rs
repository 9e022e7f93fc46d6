//! Trait abstractions for dependency injection and testability.
//!
//! External collaborators — the product lookup service, the peer-connection
//! factory, the websocket transport and the wall clock — sit behind these
//! traits so the auction core can be exercised without real network I/O.

pub mod catalog;
pub mod peer;
pub mod time;
pub mod transport;

// Re-export all traits for crate-internal use.
// The public API surface is controlled by lib.rs re-exports.
pub use catalog::{ProductCatalog, ProductTerms};
pub use peer::{PeerConnection, PeerConnectionFactory, PeerEventSink};
pub use time::TimeProvider;
pub use transport::EventTransport;

// Re-export default implementations
pub use time::SystemTimeProvider;
