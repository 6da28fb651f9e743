//! Repository contracts consumed by the services.
//!
//! Every method is a single atomic operation against the backing store. Counter
//! and token mutations are conditional updates evaluated by the store itself,
//! never read-modify-write in the caller.

use crate::domain::Page;
use crate::domain::api_key::ApiKey;
use crate::domain::cart::{Cart, CartItem};
use crate::domain::discount::{DiscountCode, DiscountPatch, NewDiscount};
use crate::domain::product::{NewProduct, Product, ProductSort};
use crate::domain::session::{RotationOutcome, SessionKeyRecord};
use crate::domain::shop::{NewShop, Shop};
use crate::error::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

#[async_trait]
pub trait ShopStore: Send + Sync + Debug {
    /// Inserts a shop. Fails with `AppError::Conflict` if the email is taken.
    async fn create(&self, shop: NewShop) -> Result<Shop>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Shop>>;
}

#[async_trait]
pub trait KeyTokenStore: Send + Sync + Debug {
    /// Creates or replaces the user's record, resetting its used-token set.
    async fn upsert(&self, record: SessionKeyRecord) -> Result<SessionKeyRecord>;

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<SessionKeyRecord>>;

    /// Compare-and-swap on the current refresh token digest. On success the expected digest is
    /// appended to the used set and `replacement_hash` becomes current.
    async fn rotate(&self, user_id: Uuid, expected_hash: &str, replacement_hash: &str) -> Result<RotationOutcome>;

    async fn delete_by_user(&self, user_id: Uuid) -> Result<bool>;

    async fn delete_by_id(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait DiscountStore: Send + Sync + Debug {
    /// Inserts a code, replacing an inactive code with the same `(shop_id, code)`.
    /// Fails with `AppError::Conflict` if an active one exists.
    async fn insert(&self, discount: NewDiscount) -> Result<DiscountCode>;

    async fn find_by_code(&self, shop_id: Uuid, code: &str) -> Result<Option<DiscountCode>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DiscountCode>>;

    async fn update(&self, id: Uuid, patch: &DiscountPatch) -> Result<Option<DiscountCode>>;

    async fn list_active_for_shop(&self, shop_id: Uuid, page: Page) -> Result<Vec<DiscountCode>>;

    /// Decrements remaining uses and bumps the user's count in one step, guarded by the code being
    /// active, inside its window, not exhausted, and under the per-user cap. `None` if a guard failed.
    async fn redeem(&self, shop_id: Uuid, code: &str, user_id: Uuid, now: OffsetDateTime)
    -> Result<Option<DiscountCode>>;

    /// Reverses one redemption by the user in one step. `None` if the user has none on record.
    async fn cancel(&self, shop_id: Uuid, code: &str, user_id: Uuid) -> Result<Option<DiscountCode>>;

    async fn delete(&self, shop_id: Uuid, code: &str) -> Result<Option<DiscountCode>>;
}

#[async_trait]
pub trait CartStore: Send + Sync + Debug {
    /// Creates the active cart on demand, then adds the item or increments its quantity.
    async fn add_item(&self, user_id: Uuid, item: CartItem) -> Result<Cart>;

    /// Adds `delta` to an existing line. Returns the new quantity, `None` if the line is absent.
    async fn adjust_quantity(&self, user_id: Uuid, product_id: Uuid, delta: i64) -> Result<Option<i64>>;

    async fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> Result<bool>;

    async fn find_active(&self, user_id: Uuid) -> Result<Option<Cart>>;
}

/// Restriction applied to public product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub shop_id: Option<Uuid>,
    pub ids: Option<Vec<Uuid>>,
}

#[async_trait]
pub trait ProductStore: Send + Sync + Debug {
    async fn insert(&self, product: NewProduct) -> Result<Product>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>>;

    /// Replaces the editable fields of a product owned by `product.shop_id`.
    async fn update(&self, product: &Product) -> Result<Option<Product>>;

    /// Flips the draft/published flags of a product owned by `shop_id`.
    async fn set_published(&self, shop_id: Uuid, id: Uuid, published: bool) -> Result<bool>;

    /// The shop's drafts (`published == false`) or published products, newest first.
    async fn list_for_shop(&self, shop_id: Uuid, published: bool, page: Page) -> Result<Vec<Product>>;

    async fn list_published(&self, filter: &ProductFilter, sort: ProductSort, page: Page) -> Result<Vec<Product>>;

    /// Case-insensitive match on the name or description of published products.
    async fn search_published(&self, key: &str) -> Result<Vec<Product>>;
}

#[async_trait]
pub trait ApiKeyStore: Send + Sync + Debug {
    async fn find(&self, key: &str) -> Result<Option<ApiKey>>;

    /// Inserts the key unless it already exists.
    async fn ensure(&self, key: ApiKey) -> Result<()>;
}

/// The full set of stores the services are wired with.
#[derive(Clone, Debug)]
pub struct Stores {
    pub shops: Arc<dyn ShopStore>,
    pub key_tokens: Arc<dyn KeyTokenStore>,
    pub discounts: Arc<dyn DiscountStore>,
    pub carts: Arc<dyn CartStore>,
    pub products: Arc<dyn ProductStore>,
    pub api_keys: Arc<dyn ApiKeyStore>,
}
