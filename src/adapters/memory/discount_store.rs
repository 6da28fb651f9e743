use crate::domain::Page;
use crate::domain::discount::{DiscountCode, DiscountPatch, NewDiscount};
use crate::error::{AppError, Result};
use crate::storage::DiscountStore;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::OffsetDateTime;
use uuid::Uuid;

type CodeKey = (Uuid, String);

/// Codes keyed by `(shop_id, code)` so uniqueness and redemption guards share one lock.
#[derive(Debug, Default)]
pub struct MemoryDiscountStore {
    codes: DashMap<CodeKey, DiscountCode>,
}

impl MemoryDiscountStore {
    fn key_of(&self, id: Uuid) -> Option<CodeKey> {
        self.codes.iter().find(|entry| entry.id == id).map(|entry| entry.key().clone())
    }
}

#[async_trait]
impl DiscountStore for MemoryDiscountStore {
    async fn insert(&self, discount: NewDiscount) -> Result<DiscountCode> {
        let discount = discount.into_discount(Uuid::new_v4());
        match self.codes.entry((discount.shop_id, discount.code.clone())) {
            Entry::Occupied(entry) if entry.get().is_active => Err(AppError::Conflict("Discount exists!".into())),
            Entry::Occupied(mut entry) => {
                entry.insert(discount.clone());
                Ok(discount)
            }
            Entry::Vacant(entry) => {
                entry.insert(discount.clone());
                Ok(discount)
            }
        }
    }

    async fn find_by_code(&self, shop_id: Uuid, code: &str) -> Result<Option<DiscountCode>> {
        Ok(self.codes.get(&(shop_id, code.to_string())).map(|d| d.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DiscountCode>> {
        Ok(self.codes.iter().find(|entry| entry.id == id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, id: Uuid, patch: &DiscountPatch) -> Result<Option<DiscountCode>> {
        let Some(key) = self.key_of(id) else {
            return Ok(None);
        };

        let renamed = patch.code.as_ref().filter(|code| **code != key.1);
        let Some(new_code) = renamed else {
            let Some(mut discount) = self.codes.get_mut(&key) else {
                return Ok(None);
            };
            let mut patched = discount.clone();
            patched.apply_patch(patch);
            patched.validate()?;
            *discount = patched.clone();
            return Ok(Some(patched));
        };

        let Some((_, mut discount)) = self.codes.remove(&key) else {
            return Ok(None);
        };
        let original = discount.clone();
        discount.apply_patch(patch);
        if let Err(e) = discount.validate() {
            self.codes.insert(key, original);
            return Err(e);
        }
        let clash = match self.codes.entry((key.0, new_code.clone())) {
            Entry::Occupied(_) => true,
            Entry::Vacant(entry) => {
                entry.insert(discount.clone());
                false
            }
        };
        if clash {
            self.codes.insert(key, original);
            return Err(AppError::Conflict("Discount exists!".into()));
        }
        Ok(Some(discount))
    }

    async fn list_active_for_shop(&self, shop_id: Uuid, page: Page) -> Result<Vec<DiscountCode>> {
        let mut codes: Vec<DiscountCode> = self
            .codes
            .iter()
            .filter(|entry| entry.shop_id == shop_id && entry.is_active)
            .map(|entry| entry.value().clone())
            .collect();
        codes.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(page.slice(&codes))
    }

    async fn redeem(
        &self,
        shop_id: Uuid,
        code: &str,
        user_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<Option<DiscountCode>> {
        let Some(mut discount) = self.codes.get_mut(&(shop_id, code.to_string())) else {
            return Ok(None);
        };
        Ok(discount.try_redeem(user_id, now).then(|| discount.value().clone()))
    }

    async fn cancel(&self, shop_id: Uuid, code: &str, user_id: Uuid) -> Result<Option<DiscountCode>> {
        let Some(mut discount) = self.codes.get_mut(&(shop_id, code.to_string())) else {
            return Ok(None);
        };
        Ok(discount.try_cancel(user_id).then(|| discount.value().clone()))
    }

    async fn delete(&self, shop_id: Uuid, code: &str) -> Result<Option<DiscountCode>> {
        Ok(self.codes.remove(&(shop_id, code.to_string())).map(|(_, discount)| discount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::discount::{AppliesTo, DiscountType};
    use std::sync::Arc;
    use time::Duration;

    fn new_discount(shop_id: Uuid, code: &str, max_uses: i64) -> NewDiscount {
        let now = OffsetDateTime::now_utc();
        NewDiscount {
            shop_id,
            name: "Spring".into(),
            description: String::new(),
            code: code.into(),
            discount_type: DiscountType::FixedAmount,
            value: 5,
            max_value: None,
            min_order_value: 0,
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(1),
            max_uses,
            uses_count: 0,
            max_uses_per_user: 0,
            is_active: true,
            applies_to: AppliesTo::All,
            product_ids: vec![],
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_active_duplicate_and_replaces_inactive() {
        let store = MemoryDiscountStore::default();
        let shop_id = Uuid::new_v4();

        let first = store.insert(new_discount(shop_id, "SPRING", 1)).await.unwrap();
        let dup = store.insert(new_discount(shop_id, "SPRING", 1)).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        store.update(first.id, &DiscountPatch { is_active: Some(false), ..DiscountPatch::default() }).await.unwrap();
        let replaced = store.insert(new_discount(shop_id, "SPRING", 3)).await.unwrap();
        assert_ne!(replaced.id, first.id);
        assert_eq!(store.find_by_code(shop_id, "SPRING").await.unwrap().unwrap().max_uses, 3);
    }

    #[tokio::test]
    async fn test_rename_keeps_lookup_consistent() {
        let store = MemoryDiscountStore::default();
        let shop_id = Uuid::new_v4();
        let discount = store.insert(new_discount(shop_id, "OLD", 1)).await.unwrap();
        store.insert(new_discount(shop_id, "TAKEN", 1)).await.unwrap();

        let clash = store.update(discount.id, &DiscountPatch { code: Some("TAKEN".into()), ..DiscountPatch::default() }).await;
        assert!(matches!(clash, Err(AppError::Conflict(_))));
        assert!(store.find_by_code(shop_id, "OLD").await.unwrap().is_some());

        let renamed = store
            .update(discount.id, &DiscountPatch { code: Some("NEW".into()), ..DiscountPatch::default() })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.id, discount.id);
        assert!(store.find_by_code(shop_id, "OLD").await.unwrap().is_none());
        assert!(store.find_by_code(shop_id, "NEW").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_rechecks_window_against_stored_code() {
        let store = MemoryDiscountStore::default();
        let shop_id = Uuid::new_v4();
        let discount = store.insert(new_discount(shop_id, "WINDOW", 1)).await.unwrap();
        let now = OffsetDateTime::now_utc();

        // Each patch is valid against the original window, not once the other has landed.
        let later_start = DiscountPatch { start_date: Some(now + Duration::hours(12)), ..DiscountPatch::default() };
        let earlier_end = DiscountPatch { end_date: Some(now + Duration::hours(6)), ..DiscountPatch::default() };
        store.update(discount.id, &later_start).await.unwrap().unwrap();

        let result = store.update(discount.id, &earlier_end).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        let stored = store.find_by_code(shop_id, "WINDOW").await.unwrap().unwrap();
        assert_eq!(stored.end_date, discount.end_date);

        let renamed = DiscountPatch { code: Some("RENAMED".into()), ..earlier_end };
        let result = store.update(discount.id, &renamed).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(store.find_by_code(shop_id, "WINDOW").await.unwrap().is_some());
        assert!(store.find_by_code(shop_id, "RENAMED").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_redemptions_allow_exactly_one() {
        let store = Arc::new(MemoryDiscountStore::default());
        let shop_id = Uuid::new_v4();
        store.insert(new_discount(shop_id, "ONCE", 1)).await.unwrap();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store.redeem(shop_id, "ONCE", Uuid::new_v4(), OffsetDateTime::now_utc()).await.unwrap()
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        let discount = store.find_by_code(shop_id, "ONCE").await.unwrap().unwrap();
        assert_eq!(discount.max_uses, 0);
        assert_eq!(discount.uses_count, 1);
        assert_eq!(discount.users_used.len(), 1);
    }
}
