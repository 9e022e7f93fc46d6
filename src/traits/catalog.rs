//! Product metadata lookup abstraction.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::AuctionResult;
use crate::ids::ProductId;

/// Pricing and timing terms a product is auctioned under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductTerms {
    /// Opening price in atomic currency units.
    pub price: u64,
    /// Total operating time of the auction.
    pub operate_time: Duration,
    /// Amount added to the asking price per concluded tick.
    pub per_price: u64,
}

/// Read-only lookup of the product a seller wants to auction.
///
/// A missing or failed lookup must abort auction creation; the registry
/// leaves no partial state behind in that case.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch the auction terms for a product.
    async fn terms_for(&self, product: &ProductId) -> AuctionResult<ProductTerms>;
}
