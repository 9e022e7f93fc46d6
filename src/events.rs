//! Wire-level events exchanged with clients.
//!
//! Inbound [`ClientEvent`]s arrive from the socket layer already parsed;
//! outbound [`ServerEvent`]s are handed to the [`EventTransport`] for
//! delivery. Both serialize as `{"event": ..., "data": ...}` with the field
//! spellings the browser client expects.
//!
//! [`EventTransport`]: crate::traits::EventTransport

use serde::{Deserialize, Serialize};

use crate::ids::{ProductId, UserId};

/// A WebRTC session description carried by offer/answer events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// `"offer"` or `"answer"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: "offer".to_string(),
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: "answer".to_string(),
            sdp: sdp.into(),
        }
    }
}

/// A trickled ICE candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u32>,
}

/// Events a connection may send to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Binds the connection to a user identity.
    #[serde(rename_all = "camelCase")]
    Identify { user_id: UserId },

    /// Starts an auction; the sender becomes the seller.
    #[serde(rename_all = "camelCase")]
    OpenAuction { product_id: ProductId, user_id: UserId },

    /// Joins an open auction as a bidder.
    #[serde(rename_all = "camelCase")]
    JoinAuction { product_id: ProductId, user_id: UserId },

    /// Explicit bid attempt at the stated price.
    #[serde(rename_all = "camelCase")]
    Conclusion { product_id: ProductId, price: u64 },

    /// Bid attempt at the current asking price.
    #[serde(rename_all = "camelCase")]
    SendAskPrice { product_id: ProductId },

    /// Chat message relayed to all participants of the product.
    #[serde(rename_all = "camelCase")]
    SendMessage {
        product_id: ProductId,
        message: String,
        user_id: UserId,
    },

    /// Producer-side session description.
    SenderOffer { sdp: SessionDescription },

    /// Producer-side ICE candidate. `None` candidates are tolerated.
    SenderCandidate { candidate: Option<IceCandidate> },

    /// Consumer-side session description.
    ReceiverOffer { sdp: SessionDescription },

    /// Consumer-side ICE candidate. `None` candidates are tolerated.
    ReceiverCandidate { candidate: Option<IceCandidate> },

    /// Seller-only request to abort the auction.
    #[serde(rename_all = "camelCase")]
    ForceExit { user_id: UserId },

    /// Producer disconnect notice.
    #[serde(rename_all = "camelCase")]
    Close { product_id: ProductId },
}

/// Events the server emits to connections or product rooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Current winner (empty string while none) and the next asking price.
    #[serde(rename_all = "camelCase")]
    UpdateAuctionStatus { status: String, next_price: u64 },

    /// Names the seller of the auction the receiver just entered.
    #[serde(rename_all = "camelCase")]
    CallSeller { user_id: UserId },

    /// A participant joined; carries the updated roster size.
    #[serde(rename_all = "camelCase")]
    JoinUser {
        user_id: UserId,
        updated_user_length: usize,
    },

    /// Bidding is now allowed. Broadcast exactly once per auction.
    StartAuction,

    /// The auction stream is live; payload names the seller.
    #[serde(rename_all = "camelCase")]
    AuctionStart { user_id: UserId },

    /// The seller aborted the auction.
    ForceAuctionExit,

    /// The auction closed on timeout or bid starvation; names the seller.
    #[serde(rename_all = "camelCase")]
    AuctionExit { user_id: UserId },

    /// Join refused: no auction is open for the requested product.
    DontOpenAuction,

    /// Join refused: the connection already participates elsewhere.
    #[serde(rename_all = "camelCase")]
    GoUserAuction { other_auction_product_id: ProductId },

    /// Relayed chat message.
    #[serde(rename_all = "camelCase")]
    ReceiveMessage { user_id: String, message: String },

    /// Seconds left until the auction's operating time expires.
    #[serde(rename_all = "camelCase")]
    RemainingTime { remaining_secs: u64 },

    /// Answer to the producer's offer.
    GetSenderAnswer { sdp: SessionDescription },

    /// ICE candidate produced by the server-side producer connection.
    GetSenderCandidate { candidate: IceCandidate },

    /// Answer to a consumer's offer.
    GetReceiverAnswer { sdp: SessionDescription },

    /// ICE candidate produced by a server-side consumer connection.
    GetReceiverCandidate { candidate: IceCandidate },
}
