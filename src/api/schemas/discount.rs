use crate::domain::Page;
use crate::domain::discount::{AppliesTo, DiscountPatch, DiscountType, NewDiscount, OrderLine};
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiscount {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub code: String,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub value: i64,
    #[serde(default)]
    pub max_value: Option<i64>,
    #[serde(default)]
    pub min_order_value: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    pub max_uses: i64,
    #[serde(default)]
    pub uses_count: i64,
    #[serde(default)]
    pub max_uses_per_user: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub applies_to: AppliesTo,
    #[serde(default)]
    pub product_ids: Vec<Uuid>,
}

const fn default_active() -> bool {
    true
}

impl CreateDiscount {
    #[must_use]
    pub fn into_new(self, shop_id: Uuid) -> NewDiscount {
        NewDiscount {
            shop_id,
            name: self.name,
            description: self.description,
            code: self.code,
            discount_type: self.discount_type,
            value: self.value,
            max_value: self.max_value,
            min_order_value: self.min_order_value,
            start_date: self.start_date,
            end_date: self.end_date,
            max_uses: self.max_uses,
            uses_count: self.uses_count,
            max_uses_per_user: self.max_uses_per_user,
            is_active: self.is_active,
            applies_to: self.applies_to,
            product_ids: self.product_ids,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDiscount {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub discount_type: Option<DiscountType>,
    pub value: Option<i64>,
    pub max_value: Option<i64>,
    pub min_order_value: Option<i64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
    pub max_uses: Option<i64>,
    pub max_uses_per_user: Option<i64>,
    pub is_active: Option<bool>,
    pub applies_to: Option<AppliesTo>,
    pub product_ids: Option<Vec<Uuid>>,
}

impl From<UpdateDiscount> for DiscountPatch {
    fn from(update: UpdateDiscount) -> Self {
        Self {
            code: update.code,
            name: update.name,
            description: update.description,
            discount_type: update.discount_type,
            value: update.value,
            max_value: update.max_value,
            min_order_value: update.min_order_value,
            start_date: update.start_date,
            end_date: update.end_date,
            max_uses: update.max_uses,
            max_uses_per_user: update.max_uses_per_user,
            is_active: update.is_active,
            applies_to: update.applies_to,
            product_ids: update.product_ids,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountAmount {
    pub code_id: String,
    pub shop_id: Uuid,
    pub user_id: Uuid,
    pub products: Vec<OrderLine>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsForCode {
    pub code: String,
    pub shop_id: Uuid,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

impl ProductsForCode {
    #[must_use]
    pub fn page(&self) -> Page {
        let defaults = Page::default();
        Page::new(self.limit.unwrap_or(defaults.limit), self.page.unwrap_or(defaults.page))
    }
}

/// Redemption and cancellation act on behalf of the authenticated user.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeRef {
    pub code_id: String,
    pub shop_id: Uuid,
}
