use super::DbPool;
use super::records::{CartItemRecord, CartRecord};
use crate::domain::cart::{Cart, CartItem, CartState};
use crate::error::Result;
use crate::storage::CartStore;
use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct PgCartStore {
    pool: DbPool,
}

impl PgCartStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load(conn: &mut PgConnection, user_id: Uuid) -> Result<Option<Cart>> {
        let cart = sqlx::query_as::<_, CartRecord>("SELECT id, user_id, state FROM carts WHERE user_id = $1 AND state = $2")
            .bind(user_id)
            .bind(CartState::Active.as_str())
            .fetch_optional(&mut *conn)
            .await?;
        let Some(cart) = cart else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, CartItemRecord>(
            r#"
            SELECT product_id, shop_id, name, price, quantity
            FROM cart_items
            WHERE cart_id = $1
            ORDER BY added_at, product_id
            "#,
        )
        .bind(cart.id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(cart.into_cart(items)))
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    #[tracing::instrument(level = "debug", skip(self, item), fields(product_id = %item.product_id), err)]
    async fn add_item(&self, user_id: Uuid, item: CartItem) -> Result<Cart> {
        let mut tx = self.pool.begin().await?;

        let cart_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO carts (id, user_id, state)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(CartState::Active.as_str())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO cart_items (cart_id, product_id, shop_id, name, price, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (cart_id, product_id) DO UPDATE
            SET quantity = cart_items.quantity + EXCLUDED.quantity
            "#,
        )
        .bind(cart_id)
        .bind(item.product_id)
        .bind(item.shop_id)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.quantity)
        .execute(&mut *tx)
        .await?;

        let cart = Self::load(&mut tx, user_id).await?;
        tx.commit().await?;

        Ok(cart.unwrap_or_else(|| Cart::new(user_id)))
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn adjust_quantity(&self, user_id: Uuid, product_id: Uuid, delta: i64) -> Result<Option<i64>> {
        let quantity = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE cart_items
            SET quantity = cart_items.quantity + $3
            FROM carts
            WHERE carts.id = cart_items.cart_id AND carts.user_id = $1 AND cart_items.product_id = $2
            RETURNING cart_items.quantity
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quantity)
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM cart_items
            USING carts
            WHERE carts.id = cart_items.cart_id AND carts.user_id = $1 AND cart_items.product_id = $2
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn find_active(&self, user_id: Uuid) -> Result<Option<Cart>> {
        let mut conn = self.pool.acquire().await?;
        Self::load(&mut conn, user_id).await
    }
}
