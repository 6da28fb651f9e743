use crate::domain::product::{Product, ProductDetails};
use crate::error::AppError;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub(crate) struct ProductRecord {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub slug: String,
    pub thumb: String,
    pub description: String,
    pub price: i64,
    pub quantity: i64,
    pub product_type: String,
    pub attributes: Value,
    pub is_draft: bool,
    pub is_published: bool,
    pub created_at: OffsetDateTime,
}

impl TryFrom<ProductRecord> for Product {
    type Error = AppError;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        let details = ProductDetails::from_parts(&record.product_type, record.attributes).map_err(|e| {
            tracing::error!(product_id = %record.id, error = %e, "Stored product attributes are invalid");
            AppError::Internal
        })?;

        Ok(Self {
            id: record.id,
            shop_id: record.shop_id,
            name: record.name,
            slug: record.slug,
            thumb: record.thumb,
            description: record.description,
            price: record.price,
            quantity: record.quantity,
            details,
            is_draft: record.is_draft,
            is_published: record.is_published,
            created_at: Some(record.created_at),
        })
    }
}
