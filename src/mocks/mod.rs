//! Mock implementations for testing.
//!
//! One mock per trait seam, enabling unit and integration tests to run the
//! full auction flow without a websocket server, a product database or a
//! WebRTC stack.

pub mod catalog;
pub mod peer;
pub mod time;
pub mod transport;

pub use catalog::MockCatalog;
pub use peer::{MockPeerConnection, MockPeerFactory};
pub use time::MockTime;
pub use transport::{Delivery, MockTransport, RecordedEvent};
