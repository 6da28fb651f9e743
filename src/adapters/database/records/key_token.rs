use crate::domain::auth::SigningSecrets;
use crate::domain::session::SessionKeyRecord;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub(crate) struct KeyTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub refresh_token_hash: String,
    pub refresh_tokens_used: Vec<String>,
    pub primary_secret: String,
    pub secondary_secret: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<KeyTokenRecord> for SessionKeyRecord {
    fn from(record: KeyTokenRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            refresh_token_hash: record.refresh_token_hash,
            used_refresh_token_hashes: record.refresh_tokens_used,
            secrets: SigningSecrets { primary: record.primary_secret, secondary: record.secondary_secret },
            created_at: Some(record.created_at),
            updated_at: Some(record.updated_at),
        }
    }
}
