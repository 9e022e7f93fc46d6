//! Mock product catalog for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AuctionError, AuctionResult};
use crate::ids::ProductId;
use crate::traits::{ProductCatalog, ProductTerms};

/// In-memory catalog; products not inserted fail lookup like a missing
/// database row would.
#[derive(Default, Clone)]
pub struct MockCatalog {
    products: Arc<Mutex<HashMap<ProductId, ProductTerms>>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: ProductId, terms: ProductTerms) {
        self.products.lock().insert(product, terms);
    }

    /// Builder-style helper for test setup.
    pub fn with_product(
        self,
        product: impl Into<String>,
        price: u64,
        operate_time: Duration,
        per_price: u64,
    ) -> Self {
        self.insert(
            ProductId::new(product),
            ProductTerms {
                price,
                operate_time,
                per_price,
            },
        );
        self
    }
}

#[async_trait]
impl ProductCatalog for MockCatalog {
    async fn terms_for(&self, product: &ProductId) -> AuctionResult<ProductTerms> {
        self.products
            .lock()
            .get(product)
            .copied()
            .ok_or_else(|| AuctionError::Catalog(format!("unknown product {product}")))
    }
}
