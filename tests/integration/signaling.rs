//! Signaling relay scenarios: negotiation, track fan-out and candidate races.

use crate::common::harness::AuctionHarness;
use auctionhall::{ClientEvent, IceCandidate, ProductId, ServerEvent, SessionDescription};

fn candidate(label: &str) -> IceCandidate {
    IceCandidate {
        candidate: label.to_string(),
        sdp_mid: Some("0".to_string()),
        sdp_m_line_index: Some(0),
    }
}

#[tokio::test]
async fn producer_offer_is_answered_once() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 120, 10);
    h.open_auction("seller-conn", "p1", "seller").await;

    h.send(
        "seller-conn",
        ClientEvent::SenderOffer {
            sdp: SessionDescription::offer("seller-sdp"),
        },
    )
    .await;

    let answers: Vec<_> = h
        .sent_to("seller-conn")
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::GetSenderAnswer { .. }))
        .collect();
    assert_eq!(answers.len(), 1);

    let producer = h.peers.connection(0);
    let first_local = producer.local_description().expect("answer stored");

    // A duplicate offer still gets a reply, but never overwrites the
    // stored local description.
    h.send(
        "seller-conn",
        ClientEvent::SenderOffer {
            sdp: SessionDescription::offer("seller-sdp-retry"),
        },
    )
    .await;

    assert_eq!(h.peers.connection(0).local_description(), Some(first_local));
    assert_eq!(
        h.sent_to("seller-conn")
            .into_iter()
            .filter(|e| matches!(e, ServerEvent::GetSenderAnswer { .. }))
            .count(),
        2
    );
}

#[tokio::test]
async fn first_stream_wins_and_fans_out_to_joiners() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 120, 10);
    h.open_auction("seller-conn", "p1", "seller").await;

    h.go_live(0, "live");
    // A second inbound stream is ignored.
    h.go_live(0, "stale");

    h.join("conn-a", "p1", "alice").await;

    let consumer = h.peers.connection(1);
    let tracks = consumer.attached_tracks();
    assert_eq!(tracks.len(), 2);
    assert!(tracks.iter().all(|t| t.id.starts_with("live-")));
}

#[tokio::test]
async fn joining_before_any_stream_attaches_nothing_but_succeeds() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 120, 10);
    h.open_auction("seller-conn", "p1", "seller").await;

    h.join("conn-a", "p1", "alice").await;

    assert!(h.peers.connection(1).attached_tracks().is_empty());
    assert_eq!(h.registry.participant_count(&ProductId::from("p1")).await, Some(2));
}

#[tokio::test]
async fn join_refusals_touch_only_the_offender() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 120, 10);
    h.seed_product("p2", 200, 120, 20);

    // No auction open yet.
    h.join("conn-a", "p1", "alice").await;
    assert_eq!(h.sent_to("conn-a"), vec![ServerEvent::DontOpenAuction]);
    assert_eq!(h.peers.created_count(), 0);

    h.open_auction("seller-1", "p1", "seller-one").await;
    h.open_auction("seller-2", "p2", "seller-two").await;
    h.join("conn-a", "p1", "alice").await;

    let created_after_join = h.peers.created_count();

    // Already in p1: joining p2 is refused and creates no consumer state.
    h.join("conn-a", "p2", "alice").await;
    assert!(h.sent_to("conn-a").iter().any(|e| matches!(
        e,
        ServerEvent::GoUserAuction { other_auction_product_id }
            if other_auction_product_id == &ProductId::from("p1")
    )));
    assert_eq!(h.peers.created_count(), created_after_join);
    assert_eq!(h.registry.participant_count(&ProductId::from("p2")).await, Some(1));
}

#[tokio::test]
async fn candidates_reach_the_right_connection() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 120, 10);
    h.open_auction("seller-conn", "p1", "seller").await;
    h.go_live(0, "live");
    h.join("conn-a", "p1", "alice").await;

    h.send(
        "seller-conn",
        ClientEvent::SenderCandidate {
            candidate: Some(candidate("from-seller")),
        },
    )
    .await;
    h.send(
        "conn-a",
        ClientEvent::ReceiverCandidate {
            candidate: Some(candidate("from-alice")),
        },
    )
    .await;

    let producer = h.peers.connection(0);
    let consumer = h.peers.connection(1);
    assert_eq!(producer.received_candidates()[0].candidate, "from-seller");
    assert_eq!(consumer.received_candidates()[0].candidate, "from-alice");
    // One connection's negotiation never leaks into another's.
    assert_eq!(producer.received_candidates().len(), 1);
    assert_eq!(consumer.received_candidates().len(), 1);
}

#[tokio::test]
async fn candidate_races_teardown_silently() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 120, 10);
    h.open_auction("seller-conn", "p1", "seller").await;

    // Null candidate: dropped without effect.
    h.send("seller-conn", ClientEvent::SenderCandidate { candidate: None })
        .await;

    h.registry.close_auction(&ProductId::from("p1")).await;

    // The auction is gone; a late candidate and a late offer are no-ops.
    h.send(
        "seller-conn",
        ClientEvent::SenderCandidate {
            candidate: Some(candidate("late")),
        },
    )
    .await;
    h.send(
        "seller-conn",
        ClientEvent::SenderOffer {
            sdp: SessionDescription::offer("late"),
        },
    )
    .await;

    assert!(h.peers.connection(0).received_candidates().is_empty());
    assert!(h
        .sent_to("seller-conn")
        .iter()
        .all(|e| !matches!(e, ServerEvent::GetSenderAnswer { .. })));
}

#[tokio::test]
async fn produced_candidates_trickle_to_their_owner() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 120, 10);
    h.open_auction("seller-conn", "p1", "seller").await;
    h.go_live(0, "live");
    h.join("conn-a", "p1", "alice").await;

    // The RTC stack gathers local candidates on both connections.
    h.peers.sink(0).candidate_produced(candidate("ice-producer"));
    h.peers.sink(1).candidate_produced(candidate("ice-consumer"));

    assert!(h.sent_to("seller-conn").iter().any(|e| matches!(
        e,
        ServerEvent::GetSenderCandidate { candidate } if candidate.candidate == "ice-producer"
    )));
    assert!(h.sent_to("conn-a").iter().any(|e| matches!(
        e,
        ServerEvent::GetReceiverCandidate { candidate } if candidate.candidate == "ice-consumer"
    )));
}
