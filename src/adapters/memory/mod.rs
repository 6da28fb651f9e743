//! In-process stores backed by `DashMap`.
//!
//! Conditional updates run while holding the shard lock of the record they touch,
//! which gives the same per-record atomicity the database adapters get from a
//! single guarded statement.

mod api_key_store;
mod cart_store;
mod discount_store;
mod key_token_store;
mod product_store;
mod shop_store;

pub use api_key_store::MemoryApiKeyStore;
pub use cart_store::MemoryCartStore;
pub use discount_store::MemoryDiscountStore;
pub use key_token_store::MemoryKeyTokenStore;
pub use product_store::MemoryProductStore;
pub use shop_store::MemoryShopStore;

use crate::storage::Stores;
use std::sync::Arc;

/// Builds a fresh, empty set of in-memory stores.
#[must_use]
pub fn stores() -> Stores {
    Stores {
        shops: Arc::new(MemoryShopStore::default()),
        key_tokens: Arc::new(MemoryKeyTokenStore::default()),
        discounts: Arc::new(MemoryDiscountStore::default()),
        carts: Arc::new(MemoryCartStore::default()),
        products: Arc::new(MemoryProductStore::default()),
        api_keys: Arc::new(MemoryApiKeyStore::default()),
    }
}
