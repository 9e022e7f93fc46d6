use crate::ids::ProductId;

/// Domain-specific error types for the auction server library.
#[derive(Debug, thiserror::Error)]
pub enum AuctionError {
    #[error("product lookup failed: {0}")]
    Catalog(String),

    #[error("no open auction for product {0}")]
    NotOpen(ProductId),

    #[error("connection already participates in auction {0}")]
    AlreadyInAuction(ProductId),

    #[error("signaling failed: {0}")]
    Signaling(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience type alias.
pub type AuctionResult<T> = Result<T, AuctionError>;
