use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Shop,
    Writer,
    Editor,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shop => "SHOP",
            Self::Writer => "WRITER",
            Self::Editor => "EDITOR",
            Self::Admin => "ADMIN",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SHOP" => Some(Self::Shop),
            "WRITER" => Some(Self::Writer),
            "EDITOR" => Some(Self::Editor),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShopStatus {
    Active,
    Inactive,
}

impl ShopStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == "active" { Self::Active } else { Self::Inactive }
    }
}

#[derive(Debug, Clone)]
pub struct Shop {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub status: ShopStatus,
    pub verified: bool,
    pub roles: Vec<Role>,
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct NewShop {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
}

/// The public projection of a shop returned by the access endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShopInfo {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&Shop> for ShopInfo {
    fn from(shop: &Shop) -> Self {
        Self { id: shop.id, name: shop.name.clone(), email: shop.email.clone() }
    }
}
