use crate::domain::api_key::{ApiKey, Permission};
use crate::domain::shop::{Role, Shop, ShopStatus};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub(crate) struct ShopRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub status: String,
    pub verified: bool,
    pub roles: Vec<String>,
    pub created_at: OffsetDateTime,
}

impl From<ShopRecord> for Shop {
    fn from(record: ShopRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            password_hash: record.password_hash,
            status: ShopStatus::parse(&record.status),
            verified: record.verified,
            roles: record.roles.iter().filter_map(|role| Role::parse(role)).collect(),
            created_at: Some(record.created_at),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ApiKeyRecord {
    pub key: String,
    pub status: bool,
    pub permissions: Vec<String>,
}

impl From<ApiKeyRecord> for ApiKey {
    fn from(record: ApiKeyRecord) -> Self {
        Self {
            key: record.key,
            active: record.status,
            permissions: record.permissions.iter().filter_map(|p| Permission::parse(p)).collect(),
        }
    }
}
