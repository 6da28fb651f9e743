use super::DbPool;
use super::records::KeyTokenRecord;
use crate::domain::session::{RotationOutcome, SessionKeyRecord};
use crate::error::Result;
use crate::storage::KeyTokenStore;
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct PgKeyTokenStore {
    pool: DbPool,
}

impl PgKeyTokenStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyTokenStore for PgKeyTokenStore {
    #[tracing::instrument(level = "debug", skip(self, record), fields(user_id = %record.user_id), err)]
    async fn upsert(&self, record: SessionKeyRecord) -> Result<SessionKeyRecord> {
        let stored = sqlx::query_as::<_, KeyTokenRecord>(
            r#"
            INSERT INTO key_tokens (id, user_id, refresh_token_hash, refresh_tokens_used, primary_secret, secondary_secret)
            VALUES ($1, $2, $3, '{}', $4, $5)
            ON CONFLICT (user_id) DO UPDATE
            SET refresh_token_hash = EXCLUDED.refresh_token_hash,
                refresh_tokens_used = '{}',
                primary_secret = EXCLUDED.primary_secret,
                secondary_secret = EXCLUDED.secondary_secret,
                updated_at = NOW()
            RETURNING id, user_id, refresh_token_hash, refresh_tokens_used, primary_secret, secondary_secret,
                      created_at, updated_at
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.refresh_token_hash)
        .bind(&record.secrets.primary)
        .bind(&record.secrets.secondary)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored.into())
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<SessionKeyRecord>> {
        let record = sqlx::query_as::<_, KeyTokenRecord>(
            r#"
            SELECT id, user_id, refresh_token_hash, refresh_tokens_used, primary_secret, secondary_secret,
                   created_at, updated_at
            FROM key_tokens
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Into::into))
    }

    #[tracing::instrument(level = "debug", skip(self, expected_hash, replacement_hash), err)]
    async fn rotate(&self, user_id: Uuid, expected_hash: &str, replacement_hash: &str) -> Result<RotationOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE key_tokens
            SET refresh_token_hash = $3,
                refresh_tokens_used = array_append(refresh_tokens_used, $2),
                updated_at = NOW()
            WHERE user_id = $1 AND refresh_token_hash = $2
            "#,
        )
        .bind(user_id)
        .bind(expected_hash)
        .bind(replacement_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(RotationOutcome::Rotated);
        }

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM key_tokens WHERE user_id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(if exists { RotationOutcome::Stale } else { RotationOutcome::Missing })
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn delete_by_user(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM key_tokens WHERE user_id = $1").bind(user_id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn delete_by_id(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM key_tokens WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
