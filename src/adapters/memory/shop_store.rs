use crate::domain::shop::{NewShop, Shop, ShopStatus};
use crate::error::{AppError, Result};
use crate::storage::ShopStore;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::OffsetDateTime;
use uuid::Uuid;

/// Shops keyed by email, which makes the uniqueness check part of the insert.
#[derive(Debug, Default)]
pub struct MemoryShopStore {
    shops: DashMap<String, Shop>,
}

#[async_trait]
impl ShopStore for MemoryShopStore {
    async fn create(&self, shop: NewShop) -> Result<Shop> {
        match self.shops.entry(shop.email.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict("Shop already registered".into())),
            Entry::Vacant(entry) => {
                let shop = Shop {
                    id: Uuid::new_v4(),
                    name: shop.name,
                    email: shop.email,
                    password_hash: shop.password_hash,
                    status: ShopStatus::Inactive,
                    verified: false,
                    roles: shop.roles,
                    created_at: Some(OffsetDateTime::now_utc()),
                };
                entry.insert(shop.clone());
                Ok(shop)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Shop>> {
        Ok(self.shops.get(email).map(|s| s.value().clone()))
    }
}
