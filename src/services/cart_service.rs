use crate::domain::cart::{Cart, CartItem};
use crate::error::{AppError, Result};
use crate::storage::{CartStore, ProductStore};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// A requested quantity change for one product, relative to what the client last saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityChange {
    pub shop_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub old_quantity: i64,
}

#[derive(Clone, Debug)]
pub struct CartService {
    carts: Arc<dyn CartStore>,
    products: Arc<dyn ProductStore>,
}

impl CartService {
    #[must_use]
    pub fn new(carts: Arc<dyn CartStore>, products: Arc<dyn ProductStore>) -> Self {
        Self { carts, products }
    }

    /// # Errors
    /// `BadRequest` for a non-positive quantity or negative price.
    #[tracing::instrument(skip(self, item), fields(product_id = %item.product_id), err(level = "warn"))]
    pub async fn add_to_cart(&self, user_id: Uuid, item: CartItem) -> Result<Cart> {
        if item.quantity <= 0 || item.price < 0 {
            return Err(AppError::bad_request("Quantity must be positive and price must not be negative"));
        }
        self.carts.add_item(user_id, item).await
    }

    /// Moves a line to `change.quantity`. Zero removes the line.
    ///
    /// # Errors
    /// `NotFound` if the product does not exist or is not sold by `change.shop_id`.
    #[tracing::instrument(skip(self, change), fields(product_id = %change.product_id), err(level = "warn"))]
    pub async fn update(&self, user_id: Uuid, change: QuantityChange) -> Result<Option<Cart>> {
        if change.quantity < 0 {
            return Err(AppError::bad_request("Quantity must not be negative"));
        }
        let product =
            self.products.find_by_id(change.product_id).await?.ok_or_else(|| AppError::not_found("not found product"))?;
        if product.shop_id != change.shop_id {
            return Err(AppError::not_found("product do not belong to this shop"));
        }

        if change.quantity == 0 {
            self.carts.remove_item(user_id, change.product_id).await?;
            return self.carts.find_active(user_id).await;
        }

        let delta = change.quantity - change.old_quantity;
        match self.carts.adjust_quantity(user_id, change.product_id, delta).await? {
            Some(quantity) if quantity <= 0 => {
                self.carts.remove_item(user_id, change.product_id).await?;
            }
            Some(_) => {}
            None => {
                let item = CartItem {
                    product_id: product.id,
                    shop_id: product.shop_id,
                    name: product.name,
                    price: product.price,
                    quantity: change.quantity,
                };
                return self.carts.add_item(user_id, item).await.map(Some);
            }
        }
        self.carts.find_active(user_id).await
    }

    /// # Errors
    /// Returns `AppError::Database` if the delete fails.
    #[tracing::instrument(skip(self), err)]
    pub async fn delete_item(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
        self.carts.remove_item(user_id, product_id).await
    }

    /// # Errors
    /// Returns `AppError::Database` if the lookup fails.
    pub async fn get_cart(&self, user_id: Uuid) -> Result<Option<Cart>> {
        self.carts.find_active(user_id).await
    }
}
