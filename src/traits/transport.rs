//! Outbound event delivery abstraction.

use crate::events::ServerEvent;
use crate::ids::{ConnectionId, ProductId};

/// Delivery of [`ServerEvent`]s to single connections and product rooms.
///
/// Implementations wrap the websocket layer and its room-membership
/// primitives. Sends are fire-and-forget: a connection that is gone by the
/// time an event reaches it is the transport's concern, not the caller's.
/// The methods are synchronous so peer-connection event sinks can emit
/// candidates without an executor handle.
pub trait EventTransport: Send + Sync {
    /// Send an event to a single connection.
    fn send_to(&self, conn: &ConnectionId, event: ServerEvent);

    /// Broadcast an event to every connection in the product's room.
    fn broadcast(&self, product: &ProductId, event: ServerEvent);

    /// Add a connection to a product's room.
    fn enter_room(&self, conn: &ConnectionId, product: &ProductId);

    /// Remove a connection from a product's room.
    fn leave_room(&self, conn: &ConnectionId, product: &ProductId);
}
