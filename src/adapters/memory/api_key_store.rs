use crate::domain::api_key::ApiKey;
use crate::error::Result;
use crate::storage::ApiKeyStore;
use async_trait::async_trait;
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct MemoryApiKeyStore {
    keys: DashMap<String, ApiKey>,
}

#[async_trait]
impl ApiKeyStore for MemoryApiKeyStore {
    async fn find(&self, key: &str) -> Result<Option<ApiKey>> {
        Ok(self.keys.get(key).map(|k| k.value().clone()))
    }

    async fn ensure(&self, key: ApiKey) -> Result<()> {
        self.keys.entry(key.key.clone()).or_insert(key);
        Ok(())
    }
}
