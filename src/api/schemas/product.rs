use crate::domain::Page;
use crate::domain::product::{NewProduct, ProductDetails, ProductPatch, ProductSort};
use crate::error::Result;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub name: String,
    #[serde(default)]
    pub thumb: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub quantity: i64,
    pub product_type: String,
    pub product_attributes: Value,
}

impl CreateProduct {
    /// # Errors
    /// `BadRequest` if the type is unknown or the attributes do not fit it.
    pub fn into_new(self, shop_id: Uuid) -> Result<NewProduct> {
        let details = ProductDetails::from_parts(&self.product_type, self.product_attributes)?;
        Ok(NewProduct {
            shop_id,
            name: self.name,
            thumb: self.thumb,
            description: self.description,
            price: self.price,
            quantity: self.quantity,
            details,
        })
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub thumb: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub quantity: Option<i64>,
    pub product_attributes: Option<Value>,
}

impl From<UpdateProduct> for ProductPatch {
    fn from(update: UpdateProduct) -> Self {
        Self {
            name: update.name,
            thumb: update.thumb,
            description: update.description,
            price: update.price,
            quantity: update.quantity,
            attributes: update.product_attributes,
        }
    }
}

#[derive(Deserialize, Default)]
pub struct ListProducts {
    pub limit: Option<i64>,
    pub page: Option<i64>,
    #[serde(default)]
    pub sort: ProductSort,
}

impl ListProducts {
    #[must_use]
    pub fn page(&self) -> Page {
        let defaults = Page::default();
        Page::new(self.limit.unwrap_or(defaults.limit), self.page.unwrap_or(defaults.page))
    }
}
