//! Connection-identity directory.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::ids::{ConnectionId, ProductId, UserId};

/// What the server knows about one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    pub user_id: UserId,
    pub product_id: Option<ProductId>,
}

/// Maps each connection to its user identity and current product.
///
/// Entries appear on the first identifying message, gain a product on
/// open/join, and vanish on disconnect, forced exit or auction close for
/// that connection. The directory is also the authority for refusing a
/// bidder who tries to join a second auction.
#[derive(Default)]
pub struct SessionDirectory {
    entries: RwLock<HashMap<ConnectionId, SessionEntry>>,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a connection to a user identity without a product association.
    pub fn identify(&self, conn: ConnectionId, user: UserId) {
        let mut entries = self.entries.write();
        entries
            .entry(conn)
            .and_modify(|entry| entry.user_id = user.clone())
            .or_insert(SessionEntry {
                user_id: user,
                product_id: None,
            });
    }

    /// Bind a connection to a user and product in one step (open or join).
    pub fn bind(&self, conn: ConnectionId, user: UserId, product: ProductId) {
        self.entries.write().insert(
            conn,
            SessionEntry {
                user_id: user,
                product_id: Some(product),
            },
        );
    }

    pub fn user_of(&self, conn: &ConnectionId) -> Option<UserId> {
        self.entries.read().get(conn).map(|e| e.user_id.clone())
    }

    pub fn product_of(&self, conn: &ConnectionId) -> Option<ProductId> {
        self.entries.read().get(conn).and_then(|e| e.product_id.clone())
    }

    /// Product the connection is already bound to, if it differs from
    /// `product`. Used to refuse double-joining.
    pub fn other_auction_of(&self, conn: &ConnectionId, product: &ProductId) -> Option<ProductId> {
        self.product_of(conn).filter(|bound| bound != product)
    }

    /// Drop a connection's product association, keeping its identity.
    pub fn clear_product(&self, conn: &ConnectionId) {
        if let Some(entry) = self.entries.write().get_mut(conn) {
            entry.product_id = None;
        }
    }

    /// Remove a connection entirely.
    pub fn remove(&self, conn: &ConnectionId) -> Option<SessionEntry> {
        self.entries.write().remove(conn)
    }

    /// Connections currently associated with `product`.
    pub fn connections_in(&self, product: &ProductId) -> Vec<ConnectionId> {
        self.entries
            .read()
            .iter()
            .filter(|(_, entry)| entry.product_id.as_ref() == Some(product))
            .map(|(conn, _)| conn.clone())
            .collect()
    }
}
