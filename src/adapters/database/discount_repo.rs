use super::records::DiscountRecord;
use super::{DbPool, conflict_on_unique};
use crate::domain::Page;
use crate::domain::discount::{DiscountCode, DiscountPatch, NewDiscount};
use crate::error::{AppError, Result};
use crate::storage::DiscountStore;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct PgDiscountStore {
    pool: DbPool,
}

impl PgDiscountStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DiscountStore for PgDiscountStore {
    #[tracing::instrument(level = "debug", skip(self, discount), fields(shop_id = %discount.shop_id), err)]
    async fn insert(&self, discount: NewDiscount) -> Result<DiscountCode> {
        let discount = discount.into_discount(Uuid::new_v4());
        // An inactive code with the same (shop_id, code) is overwritten in place; an active one wins.
        let record = sqlx::query_as::<_, DiscountRecord>(
            r#"
            INSERT INTO discounts (
                id, shop_id, name, description, code, discount_type, value, max_value, min_order_value,
                start_date, end_date, max_uses, uses_count, max_uses_per_user, users_used, is_active,
                applies_to, product_ids
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, '{}'::jsonb, $15, $16, $17)
            ON CONFLICT (shop_id, code) DO UPDATE
            SET id = EXCLUDED.id,
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                discount_type = EXCLUDED.discount_type,
                value = EXCLUDED.value,
                max_value = EXCLUDED.max_value,
                min_order_value = EXCLUDED.min_order_value,
                start_date = EXCLUDED.start_date,
                end_date = EXCLUDED.end_date,
                max_uses = EXCLUDED.max_uses,
                uses_count = EXCLUDED.uses_count,
                max_uses_per_user = EXCLUDED.max_uses_per_user,
                users_used = '{}'::jsonb,
                is_active = EXCLUDED.is_active,
                applies_to = EXCLUDED.applies_to,
                product_ids = EXCLUDED.product_ids,
                created_at = NOW(),
                updated_at = NOW()
            WHERE discounts.is_active = FALSE
            RETURNING *
            "#,
        )
        .bind(discount.id)
        .bind(discount.shop_id)
        .bind(&discount.name)
        .bind(&discount.description)
        .bind(&discount.code)
        .bind(discount.discount_type.as_str())
        .bind(discount.value)
        .bind(discount.max_value)
        .bind(discount.min_order_value)
        .bind(discount.start_date)
        .bind(discount.end_date)
        .bind(discount.max_uses)
        .bind(discount.uses_count)
        .bind(discount.max_uses_per_user)
        .bind(discount.is_active)
        .bind(discount.applies_to.as_str())
        .bind(&discount.product_ids)
        .fetch_optional(&self.pool)
        .await?;

        record.map(DiscountCode::try_from).transpose()?.ok_or_else(|| AppError::Conflict("Discount exists!".into()))
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn find_by_code(&self, shop_id: Uuid, code: &str) -> Result<Option<DiscountCode>> {
        let record = sqlx::query_as::<_, DiscountRecord>("SELECT * FROM discounts WHERE shop_id = $1 AND code = $2")
            .bind(shop_id)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        record.map(DiscountCode::try_from).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<DiscountCode>> {
        let record = sqlx::query_as::<_, DiscountRecord>("SELECT * FROM discounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        record.map(DiscountCode::try_from).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self, patch), err)]
    async fn update(&self, id: Uuid, patch: &DiscountPatch) -> Result<Option<DiscountCode>> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, DiscountRecord>("SELECT * FROM discounts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(record) = record else {
            return Ok(None);
        };

        let mut discount = DiscountCode::try_from(record)?;
        discount.apply_patch(patch);
        // The row may have moved since the caller's check; re-check against the locked state.
        discount.validate()?;

        let record = sqlx::query_as::<_, DiscountRecord>(
            r#"
            UPDATE discounts
            SET code = $2, name = $3, description = $4, discount_type = $5, value = $6, max_value = $7,
                min_order_value = $8, start_date = $9, end_date = $10, max_uses = $11,
                max_uses_per_user = $12, is_active = $13, applies_to = $14, product_ids = $15,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(discount.id)
        .bind(&discount.code)
        .bind(&discount.name)
        .bind(&discount.description)
        .bind(discount.discount_type.as_str())
        .bind(discount.value)
        .bind(discount.max_value)
        .bind(discount.min_order_value)
        .bind(discount.start_date)
        .bind(discount.end_date)
        .bind(discount.max_uses)
        .bind(discount.max_uses_per_user)
        .bind(discount.is_active)
        .bind(discount.applies_to.as_str())
        .bind(&discount.product_ids)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_on_unique("Discount exists!"))?;

        tx.commit().await?;
        DiscountCode::try_from(record).map(Some)
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn list_active_for_shop(&self, shop_id: Uuid, page: Page) -> Result<Vec<DiscountCode>> {
        let records = sqlx::query_as::<_, DiscountRecord>(
            r#"
            SELECT * FROM discounts
            WHERE shop_id = $1 AND is_active = TRUE
            ORDER BY code
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(shop_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        records.into_iter().map(DiscountCode::try_from).collect()
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn redeem(
        &self,
        shop_id: Uuid,
        code: &str,
        user_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<Option<DiscountCode>> {
        let record = sqlx::query_as::<_, DiscountRecord>(
            r#"
            UPDATE discounts
            SET max_uses = max_uses - 1,
                uses_count = uses_count + 1,
                users_used = jsonb_set(
                    users_used,
                    ARRAY[$3::text],
                    to_jsonb(COALESCE((users_used ->> $3::text)::bigint, 0) + 1)
                ),
                updated_at = NOW()
            WHERE shop_id = $1
              AND code = $2
              AND is_active = TRUE
              AND max_uses > 0
              AND start_date <= $4
              AND end_date >= $4
              AND (max_uses_per_user = 0 OR COALESCE((users_used ->> $3::text)::bigint, 0) < max_uses_per_user)
            RETURNING *
            "#,
        )
        .bind(shop_id)
        .bind(code)
        .bind(user_id.to_string())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        record.map(DiscountCode::try_from).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn cancel(&self, shop_id: Uuid, code: &str, user_id: Uuid) -> Result<Option<DiscountCode>> {
        let record = sqlx::query_as::<_, DiscountRecord>(
            r#"
            UPDATE discounts
            SET users_used = CASE
                    WHEN (users_used ->> $3::text)::bigint <= 1 THEN users_used - $3::text
                    ELSE jsonb_set(users_used, ARRAY[$3::text], to_jsonb((users_used ->> $3::text)::bigint - 1))
                END,
                max_uses = max_uses + 1,
                uses_count = GREATEST(uses_count - 1, 0),
                updated_at = NOW()
            WHERE shop_id = $1 AND code = $2 AND (users_used ->> $3::text) IS NOT NULL
            RETURNING *
            "#,
        )
        .bind(shop_id)
        .bind(code)
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        record.map(DiscountCode::try_from).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn delete(&self, shop_id: Uuid, code: &str) -> Result<Option<DiscountCode>> {
        let record =
            sqlx::query_as::<_, DiscountRecord>("DELETE FROM discounts WHERE shop_id = $1 AND code = $2 RETURNING *")
                .bind(shop_id)
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;
        record.map(DiscountCode::try_from).transpose()
    }
}

