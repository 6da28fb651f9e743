use crate::domain::session::{RotationOutcome, SessionKeyRecord};
use crate::error::Result;
use crate::storage::KeyTokenStore;
use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryKeyTokenStore {
    records: DashMap<Uuid, SessionKeyRecord>,
}

#[async_trait]
impl KeyTokenStore for MemoryKeyTokenStore {
    async fn upsert(&self, mut record: SessionKeyRecord) -> Result<SessionKeyRecord> {
        let now = OffsetDateTime::now_utc();
        record.used_refresh_token_hashes.clear();
        record.updated_at = Some(now);

        let mut entry = self.records.entry(record.user_id).or_insert_with(|| {
            let mut fresh = record.clone();
            fresh.created_at = Some(now);
            fresh
        });
        let created_at = entry.created_at;
        let id = entry.id;
        *entry = SessionKeyRecord { id, created_at, ..record };
        Ok(entry.value().clone())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<SessionKeyRecord>> {
        Ok(self.records.get(&user_id).map(|r| r.value().clone()))
    }

    async fn rotate(&self, user_id: Uuid, expected_hash: &str, replacement_hash: &str) -> Result<RotationOutcome> {
        let Some(mut record) = self.records.get_mut(&user_id) else {
            return Ok(RotationOutcome::Missing);
        };
        if record.refresh_token_hash != expected_hash {
            return Ok(RotationOutcome::Stale);
        }
        record.used_refresh_token_hashes.push(expected_hash.to_string());
        record.refresh_token_hash = replacement_hash.to_string();
        record.updated_at = Some(OffsetDateTime::now_utc());
        Ok(RotationOutcome::Rotated)
    }

    async fn delete_by_user(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.records.remove(&user_id).is_some())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool> {
        let before = self.records.len();
        self.records.retain(|_, record| record.id != id);
        Ok(self.records.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::{SigningSecrets, hash_token};

    #[tokio::test]
    async fn test_rotate_is_compare_and_swap() {
        let store = MemoryKeyTokenStore::default();
        let user_id = Uuid::new_v4();
        store.upsert(SessionKeyRecord::issue(user_id, "rt-1", SigningSecrets::generate())).await.unwrap();

        let outcome = store.rotate(user_id, &hash_token("rt-1"), &hash_token("rt-2")).await.unwrap();
        assert_eq!(outcome, RotationOutcome::Rotated);

        let outcome = store.rotate(user_id, &hash_token("rt-1"), &hash_token("rt-3")).await.unwrap();
        assert_eq!(outcome, RotationOutcome::Stale);

        let record = store.find_by_user(user_id).await.unwrap().unwrap();
        assert!(record.is_current("rt-2"));
        assert!(record.has_used("rt-1"));

        let outcome = store.rotate(Uuid::new_v4(), &hash_token("rt-2"), &hash_token("rt-3")).await.unwrap();
        assert_eq!(outcome, RotationOutcome::Missing);
    }

    #[tokio::test]
    async fn test_upsert_resets_used_set_and_keeps_id() {
        let store = MemoryKeyTokenStore::default();
        let user_id = Uuid::new_v4();
        let first = store.upsert(SessionKeyRecord::issue(user_id, "rt-1", SigningSecrets::generate())).await.unwrap();
        store.rotate(user_id, &hash_token("rt-1"), &hash_token("rt-2")).await.unwrap();

        let second = store.upsert(SessionKeyRecord::issue(user_id, "rt-9", SigningSecrets::generate())).await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.used_refresh_token_hashes.is_empty());
        assert!(second.is_current("rt-9"));
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let store = MemoryKeyTokenStore::default();
        let record = store.upsert(SessionKeyRecord::issue(Uuid::new_v4(), "rt", SigningSecrets::generate())).await.unwrap();

        assert!(store.delete_by_id(record.id).await.unwrap());
        assert!(!store.delete_by_id(record.id).await.unwrap());
        assert!(store.find_by_user(record.user_id).await.unwrap().is_none());
    }
}
