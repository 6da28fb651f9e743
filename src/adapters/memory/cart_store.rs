use crate::domain::cart::{Cart, CartItem};
use crate::error::Result;
use crate::storage::CartStore;
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

/// Active carts keyed by user.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    carts: DashMap<Uuid, Cart>,
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn add_item(&self, user_id: Uuid, item: CartItem) -> Result<Cart> {
        let mut cart = self.carts.entry(user_id).or_insert_with(|| Cart::new(user_id));
        cart.add(item);
        Ok(cart.value().clone())
    }

    async fn adjust_quantity(&self, user_id: Uuid, product_id: Uuid, delta: i64) -> Result<Option<i64>> {
        Ok(self.carts.get_mut(&user_id).and_then(|mut cart| cart.adjust(product_id, delta)))
    }

    async fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
        Ok(self.carts.get_mut(&user_id).is_some_and(|mut cart| cart.remove(product_id)))
    }

    async fn find_active(&self, user_id: Uuid) -> Result<Option<Cart>> {
        Ok(self.carts.get(&user_id).map(|cart| cart.value().clone()))
    }
}
