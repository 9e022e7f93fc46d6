//! Teardown, authorization and isolation edge cases.

use crate::common::harness::AuctionHarness;
use auctionhall::{ClientEvent, ConnectionId, ProductId, ServerEvent, TickControl, UserId};

#[tokio::test]
async fn duplicate_open_is_a_no_op() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 120, 10);

    h.open_auction("seller-conn", "p1", "seller").await;
    assert_eq!(h.peers.created_count(), 1);

    h.open_auction("other-conn", "p1", "impostor").await;

    // No second producer, and the original seller still owns the auction.
    assert_eq!(h.peers.created_count(), 1);
    h.send("other-conn", ClientEvent::ForceExit { user_id: UserId::from("impostor") }).await;
    assert!(h.is_open("p1").await);
}

#[tokio::test]
async fn failed_product_lookup_leaves_no_state_behind() {
    let h = AuctionHarness::new();

    h.open_auction("seller-conn", "ghost", "seller").await;

    assert!(!h.is_open("ghost").await);
    assert_eq!(h.peers.created_count(), 0);
    assert_eq!(h.sent_to("seller-conn"), vec![ServerEvent::DontOpenAuction]);
    assert!(h
        .registry
        .sessions()
        .product_of(&ConnectionId::from("seller-conn"))
        .is_none());
}

#[tokio::test]
async fn force_exit_by_non_seller_has_no_effect() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 120, 10);
    h.open_auction("seller-conn", "p1", "seller").await;
    h.go_live(0, "live");
    h.join("conn-a", "p1", "alice").await;

    h.send("conn-a", ClientEvent::ForceExit { user_id: UserId::from("alice") }).await;

    assert!(h.is_open("p1").await);
    assert!(h
        .transport
        .events()
        .iter()
        .all(|r| !matches!(r.event, ServerEvent::ForceAuctionExit)));

    // The auction keeps ticking normally afterwards.
    assert_eq!(h.tick("p1").await, TickControl::Continue);
}

#[tokio::test]
async fn force_exit_by_seller_notifies_losers_only() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 600, 10);
    h.open_auction("seller-conn", "p1", "seller").await;
    h.go_live(0, "live");
    h.join("conn-a", "p1", "alice").await;
    h.join("conn-b", "p1", "bob").await;

    // Bob becomes the determined winner.
    h.tick_n("p1", 13).await;
    h.bid("conn-b", "p1", 130).await;
    h.tick("p1").await;

    h.send("seller-conn", ClientEvent::ForceExit { user_id: UserId::from("seller") }).await;

    assert!(h
        .sent_to("conn-a")
        .iter()
        .any(|e| matches!(e, ServerEvent::ForceAuctionExit)));
    assert!(h
        .sent_to("conn-b")
        .iter()
        .all(|e| !matches!(e, ServerEvent::ForceAuctionExit)));
    assert!(h
        .sent_to("seller-conn")
        .iter()
        .all(|e| !matches!(e, ServerEvent::ForceAuctionExit)));
    assert!(!h.is_open("p1").await);
}

#[tokio::test]
async fn close_clears_every_trace_of_the_product() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 120, 10);
    h.open_auction("seller-conn", "p1", "seller").await;
    h.go_live(0, "live");
    h.join("conn-a", "p1", "alice").await;
    h.join("conn-b", "p1", "bob").await;

    let product = ProductId::from("p1");
    h.registry.close_auction(&product).await;

    assert!(!h.is_open("p1").await);
    assert!(h.registry.sessions().connections_in(&product).is_empty());
    assert!(h.transport.room_members(&product).is_empty());
    for index in 0..h.peers.created_count() {
        assert!(h.peers.connection(index).is_closed());
    }

    // Closing again, or from another trigger path, is harmless.
    h.registry.close_auction(&product).await;
    h.registry.force_exit(&product, &ConnectionId::from("seller-conn")).await;
}

#[tokio::test]
async fn producer_close_event_requires_the_producing_connection() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 120, 10);
    h.open_auction("seller-conn", "p1", "seller").await;
    h.go_live(0, "live");
    h.join("conn-a", "p1", "alice").await;

    h.send("conn-a", ClientEvent::Close { product_id: ProductId::from("p1") }).await;
    assert!(h.is_open("p1").await);

    h.send("seller-conn", ClientEvent::Close { product_id: ProductId::from("p1") }).await;
    assert!(!h.is_open("p1").await);
}

#[tokio::test]
async fn products_tick_in_isolation() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 600, 10);
    h.seed_product("p2", 200, 600, 20);
    h.open_auction("seller-1", "p1", "seller-one").await;
    h.open_auction("seller-2", "p2", "seller-two").await;
    h.go_live(0, "live-1");
    h.join("conn-a", "p1", "alice").await;

    // p1 runs bidding; p2 is never ticked and starves on its own clock.
    h.tick_n("p1", 13).await;
    h.bid("conn-a", "p1", 150).await;
    assert_eq!(h.tick("p1").await, TickControl::Continue);

    assert!(h.is_open("p2").await);
    assert!(h.broadcasts("p2").iter().all(|e| !matches!(
        e,
        ServerEvent::UpdateAuctionStatus { status, .. } if status == "alice"
    )));

    // Tearing p1 down does not disturb p2.
    h.registry.close_auction(&ProductId::from("p1")).await;
    assert!(h.is_open("p2").await);
    assert_eq!(h.tick("p2").await, TickControl::Continue);
}

#[tokio::test]
async fn seller_disconnect_closes_the_auction() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 120, 10);
    h.open_auction("seller-conn", "p1", "seller").await;
    h.go_live(0, "live");
    h.join("conn-a", "p1", "alice").await;

    std::sync::Arc::clone(&h.registry)
        .handle_disconnect(&ConnectionId::from("seller-conn"))
        .await;

    assert!(!h.is_open("p1").await);
    assert!(h.peers.connection(0).is_closed());
}

#[tokio::test]
async fn bidder_disconnect_releases_only_their_participation() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 120, 10);
    h.open_auction("seller-conn", "p1", "seller").await;
    h.go_live(0, "live");
    h.join("conn-a", "p1", "alice").await;
    h.join("conn-b", "p1", "bob").await;

    std::sync::Arc::clone(&h.registry)
        .handle_disconnect(&ConnectionId::from("conn-a"))
        .await;

    assert!(h.is_open("p1").await);
    assert_eq!(h.registry.participant_count(&ProductId::from("p1")).await, Some(2));
    assert!(h.peers.connection(1).is_closed());
    assert!(!h.peers.connection(2).is_closed());
}
