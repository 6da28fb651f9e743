use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectronicsAttributes {
    pub manufacturer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Attributes shared by soft goods: clothing and furniture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsAttributes {
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "productType", content = "productAttributes")]
pub enum ProductDetails {
    Electronics(ElectronicsAttributes),
    Clothing(GoodsAttributes),
    Furniture(GoodsAttributes),
}

impl ProductDetails {
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Electronics(_) => "Electronics",
            Self::Clothing(_) => "Clothing",
            Self::Furniture(_) => "Furniture",
        }
    }

    /// Rebuilds typed details from the stored type name and attribute document.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` if the type is unknown or the attributes do not fit it.
    pub fn from_parts(product_type: &str, attributes: Value) -> Result<Self> {
        serde_json::from_value(json!({ "productType": product_type, "productAttributes": attributes }))
            .map_err(|e| AppError::bad_request(format!("Invalid product attributes: {e}")))
    }

    /// # Errors
    /// Returns `AppError::Internal` if the attributes cannot be serialized.
    pub fn attributes(&self) -> Result<Value> {
        let value = match self {
            Self::Electronics(a) => serde_json::to_value(a),
            Self::Clothing(a) | Self::Furniture(a) => serde_json::to_value(a),
        };
        value.map_err(|_| AppError::Internal)
    }

    /// Shallow-merges `patch` into the attributes; `null` entries are ignored.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` if `patch` is not an object or the result is invalid.
    pub fn merge(&self, patch: &Value) -> Result<Self> {
        let Value::Object(patch) = patch else {
            return Err(AppError::bad_request("Product attributes must be an object"));
        };
        let mut merged = match self.attributes()? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            if !value.is_null() {
                merged.insert(key.clone(), value.clone());
            }
        }
        Self::from_parts(self.type_name(), Value::Object(merged))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub slug: String,
    pub thumb: String,
    pub description: String,
    pub price: i64,
    pub quantity: i64,
    #[serde(flatten)]
    pub details: ProductDetails,
    pub is_draft: bool,
    pub is_published: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

impl Product {
    /// Applies the provided fields of `patch`.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` if the patch breaks a field rule.
    pub fn apply_patch(&mut self, patch: &ProductPatch) -> Result<()> {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
            self.slug = slugify(name);
        }
        if let Some(thumb) = &patch.thumb {
            self.thumb.clone_from(thumb);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(attributes) = &patch.attributes {
            self.details = self.details.merge(attributes)?;
        }
        validate(&self.name, self.price, self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub shop_id: Uuid,
    pub name: String,
    pub thumb: String,
    pub description: String,
    pub price: i64,
    pub quantity: i64,
    pub details: ProductDetails,
}

impl NewProduct {
    /// # Errors
    /// Returns `AppError::BadRequest` if a field rule is broken.
    pub fn validate(&self) -> Result<()> {
        validate(&self.name, self.price, self.quantity)
    }

    /// New products start as drafts.
    #[must_use]
    pub fn into_product(self, id: Uuid) -> Product {
        Product {
            id,
            shop_id: self.shop_id,
            slug: slugify(&self.name),
            name: self.name,
            thumb: self.thumb,
            description: self.description,
            price: self.price,
            quantity: self.quantity,
            details: self.details,
            is_draft: true,
            is_published: false,
            created_at: Some(OffsetDateTime::now_utc()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub thumb: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub quantity: Option<i64>,
    pub attributes: Option<Value>,
}

fn validate(name: &str, price: i64, quantity: i64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::bad_request("Product name must not be empty"));
    }
    if price < 0 || quantity < 0 {
        return Err(AppError::bad_request("Price and quantity must not be negative"));
    }
    Ok(())
}

#[must_use]
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Ordering of public product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductSort {
    /// Newest first.
    #[default]
    Ctime,
    Oldest,
}
