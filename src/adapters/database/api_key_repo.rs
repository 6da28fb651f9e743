use super::DbPool;
use super::records::ApiKeyRecord;
use crate::domain::api_key::ApiKey;
use crate::error::Result;
use crate::storage::ApiKeyStore;
use async_trait::async_trait;

#[derive(Clone, Debug)]
pub struct PgApiKeyStore {
    pool: DbPool,
}

impl PgApiKeyStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyStore for PgApiKeyStore {
    #[tracing::instrument(level = "debug", skip_all, err)]
    async fn find(&self, key: &str) -> Result<Option<ApiKey>> {
        let record =
            sqlx::query_as::<_, ApiKeyRecord>("SELECT key, status, permissions FROM api_keys WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(record.map(Into::into))
    }

    #[tracing::instrument(level = "debug", skip_all, err)]
    async fn ensure(&self, key: ApiKey) -> Result<()> {
        let permissions: Vec<&str> = key.permissions.iter().map(|p| p.as_str()).collect();
        sqlx::query(
            r#"
            INSERT INTO api_keys (key, status, permissions)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(&key.key)
        .bind(key.active)
        .bind(&permissions)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
