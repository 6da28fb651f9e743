use super::records::ShopRecord;
use super::{DbPool, conflict_on_unique};
use crate::domain::shop::{NewShop, Shop, ShopStatus};
use crate::error::Result;
use crate::storage::ShopStore;
use async_trait::async_trait;

#[derive(Clone, Debug)]
pub struct PgShopStore {
    pool: DbPool,
}

impl PgShopStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShopStore for PgShopStore {
    #[tracing::instrument(level = "debug", skip(self, shop), err)]
    async fn create(&self, shop: NewShop) -> Result<Shop> {
        let roles: Vec<&str> = shop.roles.iter().map(|role| role.as_str()).collect();
        let record = sqlx::query_as::<_, ShopRecord>(
            r#"
            INSERT INTO shops (name, email, password_hash, status, roles)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, status, verified, roles, created_at
            "#,
        )
        .bind(&shop.name)
        .bind(&shop.email)
        .bind(&shop.password_hash)
        .bind(ShopStatus::Inactive.as_str())
        .bind(&roles)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_on_unique("Shop already registered!"))?;

        Ok(record.into())
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<Shop>> {
        let record = sqlx::query_as::<_, ShopRecord>(
            r#"
            SELECT id, name, email, password_hash, status, verified, roles, created_at
            FROM shops
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Into::into))
    }
}
