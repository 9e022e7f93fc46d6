//! Mock event transport recording sends, broadcasts and room membership.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::events::ServerEvent;
use crate::ids::{ConnectionId, ProductId};
use crate::traits::EventTransport;

/// Where a recorded event was addressed.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    To(ConnectionId),
    Room(ProductId),
}

/// One recorded outbound event, for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub delivery: Delivery,
    pub event: ServerEvent,
}

/// Transport double capturing everything the registry emits.
#[derive(Default, Clone)]
pub struct MockTransport {
    sent: Arc<Mutex<Vec<RecordedEvent>>>,
    rooms: Arc<Mutex<HashMap<ProductId, Vec<ConnectionId>>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded event, in emission order.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.sent.lock().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }

    /// Events addressed directly to `conn`.
    pub fn sent_to(&self, conn: &ConnectionId) -> Vec<ServerEvent> {
        self.sent
            .lock()
            .iter()
            .filter(|r| r.delivery == Delivery::To(conn.clone()))
            .map(|r| r.event.clone())
            .collect()
    }

    /// Events broadcast to `product`'s room.
    pub fn broadcasts_to(&self, product: &ProductId) -> Vec<ServerEvent> {
        self.sent
            .lock()
            .iter()
            .filter(|r| r.delivery == Delivery::Room(product.clone()))
            .map(|r| r.event.clone())
            .collect()
    }

    /// Current membership of `product`'s room.
    pub fn room_members(&self, product: &ProductId) -> Vec<ConnectionId> {
        self.rooms.lock().get(product).cloned().unwrap_or_default()
    }
}

impl EventTransport for MockTransport {
    fn send_to(&self, conn: &ConnectionId, event: ServerEvent) {
        self.sent.lock().push(RecordedEvent {
            delivery: Delivery::To(conn.clone()),
            event,
        });
    }

    fn broadcast(&self, product: &ProductId, event: ServerEvent) {
        self.sent.lock().push(RecordedEvent {
            delivery: Delivery::Room(product.clone()),
            event,
        });
    }

    fn enter_room(&self, conn: &ConnectionId, product: &ProductId) {
        let mut rooms = self.rooms.lock();
        let members = rooms.entry(product.clone()).or_default();
        if !members.contains(conn) {
            members.push(conn.clone());
        }
    }

    fn leave_room(&self, conn: &ConnectionId, product: &ProductId) {
        if let Some(members) = self.rooms.lock().get_mut(product) {
            members.retain(|member| member != conn);
        }
    }
}
