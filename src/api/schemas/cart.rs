use crate::domain::cart::CartItem;
use crate::error::{AppError, Result};
use crate::services::cart_service::QuantityChange;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub user_id: Uuid,
    pub product: CartItem,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemProduct {
    pub product_id: Uuid,
    pub quantity: i64,
    #[serde(default)]
    pub old_quantity: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopOrder {
    pub shop_id: Uuid,
    pub item_products: Vec<ItemProduct>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCart {
    pub user_id: Uuid,
    pub shop_order_ids: Vec<ShopOrder>,
}

impl UpdateCart {
    /// Only the first item of the first shop order is applied.
    ///
    /// # Errors
    /// `BadRequest` when there is no item to apply.
    pub fn first_change(&self) -> Result<QuantityChange> {
        let order =
            self.shop_order_ids.first().ok_or_else(|| AppError::bad_request("shopOrderIds must not be empty"))?;
        let item =
            order.item_products.first().ok_or_else(|| AppError::bad_request("itemProducts must not be empty"))?;
        Ok(QuantityChange {
            shop_id: order.shop_id,
            product_id: item.product_id,
            quantity: item.quantity,
            old_quantity: item.old_quantity,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCartItem {
    pub user_id: Uuid,
    pub product_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuery {
    pub user_id: Uuid,
}
