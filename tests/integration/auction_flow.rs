//! End-to-end auction lifecycle scenarios driven tick by tick.

use crate::common::harness::AuctionHarness;
use auctionhall::{ServerEvent, TickControl, UserId};

fn status_updates(events: &[ServerEvent]) -> Vec<(String, u64)> {
    events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::UpdateAuctionStatus { status, next_price } => {
                Some((status.clone(), *next_price))
            }
            _ => None,
        })
        .collect()
}

fn count_start_auction(events: &[ServerEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, ServerEvent::StartAuction))
        .count()
}

#[tokio::test]
async fn open_broadcasts_initial_status_and_roster() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 120, 10);
    h.open_auction("seller-conn", "p1", "seller").await;

    let events = h.broadcasts("p1");
    assert_eq!(
        status_updates(&events),
        vec![(String::new(), 100)],
        "initial status carries an empty winner and the opening price"
    );
    assert!(events.iter().any(|e| matches!(
        e,
        ServerEvent::JoinUser {
            updated_user_length: 1,
            ..
        }
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        ServerEvent::AuctionStart { user_id } if user_id == &UserId::from("seller")
    )));
    assert!(h.is_open("p1").await);
}

#[tokio::test]
async fn start_auction_fires_exactly_once_then_operate_expiry_closes() {
    // operate 65s at a 5s tick = 13 ticks; description ends at tick 12.
    let h = AuctionHarness::new();
    h.seed_product("p65", 100, 65, 10);
    h.open_auction("seller-conn", "p65", "seller").await;

    h.tick_n("p65", 11).await;
    assert_eq!(count_start_auction(&h.broadcasts("p65")), 0);

    assert_eq!(h.tick("p65").await, TickControl::Continue);
    assert_eq!(count_start_auction(&h.broadcasts("p65")), 1);

    // Tick 13 exhausts the operating time; the exit notice names the seller.
    assert_eq!(h.tick("p65").await, TickControl::Stop);
    assert_eq!(count_start_auction(&h.broadcasts("p65")), 1);
    assert!(h.broadcasts("p65").iter().any(|e| matches!(
        e,
        ServerEvent::AuctionExit { user_id } if user_id == &UserId::from("seller")
    )));
    assert!(!h.is_open("p65").await);
}

#[tokio::test]
async fn highest_bid_in_window_wins_with_single_increment() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 120, 10);
    h.open_auction("seller-conn", "p1", "seller").await;
    h.go_live(0, "stream");
    h.join("conn-a", "p1", "alice").await;
    h.join("conn-b", "p1", "bob").await;

    // Through description (12) and grace (13) into the first steady window.
    h.tick_n("p1", 13).await;

    // Same window: alice at the asking price, bob explicit at 130.
    h.bid_ask_price("conn-a", "p1").await;
    h.bid("conn-b", "p1", 130).await;

    assert_eq!(h.tick("p1").await, TickControl::Continue);

    let statuses = status_updates(&h.broadcasts("p1"));
    assert_eq!(
        statuses.last(),
        Some(&("bob".to_string(), 110)),
        "one winner per tick; price advances by exactly one increment"
    );
}

#[tokio::test]
async fn no_conclusion_resolves_before_tick_13() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 600, 10);
    h.open_auction("seller-conn", "p1", "seller").await;
    h.go_live(0, "stream");
    h.join("conn-a", "p1", "alice").await;

    let mut first_win_tick = None;
    for tick in 1..=14u32 {
        // A bid lands between every pair of ticks; everything sent while
        // the description phase is still current is dropped.
        h.bid("conn-a", "p1", 500).await;
        h.tick("p1").await;
        let concluded = status_updates(&h.broadcasts("p1"))
            .iter()
            .any(|(status, _)| status == "alice");
        if concluded {
            first_win_tick = Some(tick);
            break;
        }
    }

    assert_eq!(first_win_tick, Some(13));
}

#[tokio::test]
async fn price_is_non_decreasing_across_conclusions() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 600, 10);
    h.open_auction("seller-conn", "p1", "seller").await;
    h.go_live(0, "stream");
    h.join("conn-a", "p1", "alice").await;

    h.tick_n("p1", 13).await;

    for _ in 0..4 {
        h.bid_ask_price("conn-a", "p1").await;
        h.tick("p1").await;
    }

    let prices: Vec<u64> = status_updates(&h.broadcasts("p1"))
        .iter()
        .map(|(_, price)| *price)
        .collect();
    assert!(prices.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(prices.last(), Some(&140), "four conclusions from 100 by 10");
}

#[tokio::test]
async fn silent_auction_auto_closes_after_grace_window() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 600, 10);
    h.open_auction("seller-conn", "p1", "seller").await;

    let mut closed_at = None;
    for tick in 1..=20u32 {
        if h.tick("p1").await == TickControl::Stop {
            closed_at = Some(tick);
            break;
        }
    }

    // Grace deadline at tick 14, plus a full grace window (2 ticks) of
    // silence: the auction dies at tick 15 having never seen a bid.
    assert_eq!(closed_at, Some(15));
    assert!(h.broadcasts("p1").iter().any(|e| matches!(
        e,
        ServerEvent::AuctionExit { user_id } if user_id == &UserId::from("seller")
    )));
    assert!(!h.is_open("p1").await);
}

#[tokio::test]
async fn conclusions_keep_a_starving_auction_alive() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 600, 10);
    h.open_auction("seller-conn", "p1", "seller").await;
    h.go_live(0, "stream");
    h.join("conn-a", "p1", "alice").await;

    h.tick_n("p1", 14).await;

    // One silent window has passed; a conclusion resets the starvation run.
    h.bid_ask_price("conn-a", "p1").await;
    assert_eq!(h.tick("p1").await, TickControl::Continue);

    assert_eq!(h.tick("p1").await, TickControl::Continue);
    assert_eq!(h.tick("p1").await, TickControl::Stop);
}

#[tokio::test]
async fn chat_messages_relay_to_the_product_room() {
    let h = AuctionHarness::new();
    h.seed_product("p1", 100, 120, 10);
    h.open_auction("seller-conn", "p1", "seller").await;

    h.send(
        "seller-conn",
        auctionhall::ClientEvent::SendMessage {
            product_id: auctionhall::ProductId::from("p1"),
            message: "starting soon".to_string(),
            user_id: UserId::from("seller"),
        },
    )
    .await;

    assert!(h.broadcasts("p1").iter().any(|e| matches!(
        e,
        ServerEvent::ReceiveMessage { user_id, message }
            if user_id == "seller : " && message == "starting soon"
    )));
}
