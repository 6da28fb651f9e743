use crate::domain::discount::{AppliesTo, DiscountCode, DiscountType};
use crate::error::AppError;
use sqlx::types::Json;
use std::collections::BTreeMap;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub(crate) struct DiscountRecord {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub description: String,
    pub code: String,
    pub discount_type: String,
    pub value: i64,
    pub max_value: Option<i64>,
    pub min_order_value: i64,
    pub start_date: OffsetDateTime,
    pub end_date: OffsetDateTime,
    pub max_uses: i64,
    pub uses_count: i64,
    pub max_uses_per_user: i64,
    pub users_used: Json<BTreeMap<Uuid, i64>>,
    pub is_active: bool,
    pub applies_to: String,
    pub product_ids: Vec<Uuid>,
}

impl TryFrom<DiscountRecord> for DiscountCode {
    type Error = AppError;

    fn try_from(record: DiscountRecord) -> Result<Self, Self::Error> {
        let discount_type = DiscountType::parse(&record.discount_type).ok_or_else(|| {
            tracing::error!(discount_id = %record.id, value = %record.discount_type, "Unknown discount type in storage");
            AppError::Internal
        })?;
        let applies_to = AppliesTo::parse(&record.applies_to).ok_or_else(|| {
            tracing::error!(discount_id = %record.id, value = %record.applies_to, "Unknown discount scope in storage");
            AppError::Internal
        })?;

        Ok(Self {
            id: record.id,
            shop_id: record.shop_id,
            name: record.name,
            description: record.description,
            code: record.code,
            discount_type,
            value: record.value,
            max_value: record.max_value,
            min_order_value: record.min_order_value,
            start_date: record.start_date,
            end_date: record.end_date,
            max_uses: record.max_uses,
            uses_count: record.uses_count,
            max_uses_per_user: record.max_uses_per_user,
            users_used: record.users_used.0,
            is_active: record.is_active,
            applies_to,
            product_ids: record.product_ids,
        })
    }
}
