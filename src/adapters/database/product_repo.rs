use super::DbPool;
use super::records::ProductRecord;
use crate::domain::Page;
use crate::domain::product::{NewProduct, Product, ProductSort};
use crate::error::Result;
use crate::storage::{ProductFilter, ProductStore};
use async_trait::async_trait;
use uuid::Uuid;

const COLUMNS: &str = "id, shop_id, name, slug, thumb, description, price, quantity, product_type, attributes, \
                       is_draft, is_published, created_at";

#[derive(Clone, Debug)]
pub struct PgProductStore {
    pool: DbPool,
}

impl PgProductStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn into_products(records: Vec<ProductRecord>) -> Result<Vec<Product>> {
    records.into_iter().map(Product::try_from).collect()
}

/// Escapes `LIKE` metacharacters so the key matches literally.
fn like_pattern(key: &str) -> String {
    let escaped = key.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl ProductStore for PgProductStore {
    #[tracing::instrument(level = "debug", skip(self, product), fields(shop_id = %product.shop_id), err)]
    async fn insert(&self, product: NewProduct) -> Result<Product> {
        let product = product.into_product(Uuid::new_v4());
        let attributes = product.details.attributes()?;
        let sql = format!(
            "INSERT INTO products (id, shop_id, name, slug, thumb, description, price, quantity, product_type, \
             attributes, is_draft, is_published) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {COLUMNS}"
        );
        let record = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(product.id)
            .bind(product.shop_id)
            .bind(&product.name)
            .bind(&product.slug)
            .bind(&product.thumb)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.quantity)
            .bind(product.details.type_name())
            .bind(attributes)
            .bind(product.is_draft)
            .bind(product.is_published)
            .fetch_one(&self.pool)
            .await?;
        Product::try_from(record)
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        let sql = format!("SELECT {COLUMNS} FROM products WHERE id = $1");
        let record = sqlx::query_as::<_, ProductRecord>(&sql).bind(id).fetch_optional(&self.pool).await?;
        record.map(Product::try_from).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self, product), fields(product_id = %product.id), err)]
    async fn update(&self, product: &Product) -> Result<Option<Product>> {
        let attributes = product.details.attributes()?;
        let sql = format!(
            "UPDATE products SET name = $3, slug = $4, thumb = $5, description = $6, price = $7, quantity = $8, \
             product_type = $9, attributes = $10, updated_at = NOW() \
             WHERE id = $1 AND shop_id = $2 RETURNING {COLUMNS}"
        );
        let record = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(product.id)
            .bind(product.shop_id)
            .bind(&product.name)
            .bind(&product.slug)
            .bind(&product.thumb)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.quantity)
            .bind(product.details.type_name())
            .bind(attributes)
            .fetch_optional(&self.pool)
            .await?;
        record.map(Product::try_from).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn set_published(&self, shop_id: Uuid, id: Uuid, published: bool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_published = $3, is_draft = NOT $3, updated_at = NOW()
            WHERE id = $1 AND shop_id = $2
            "#,
        )
        .bind(id)
        .bind(shop_id)
        .bind(published)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn list_for_shop(&self, shop_id: Uuid, published: bool, page: Page) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM products WHERE shop_id = $1 AND is_published = $2 \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
        );
        let records = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(shop_id)
            .bind(published)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        into_products(records)
    }

    #[tracing::instrument(level = "debug", skip(self, filter), err)]
    async fn list_published(&self, filter: &ProductFilter, sort: ProductSort, page: Page) -> Result<Vec<Product>> {
        let order = match sort {
            ProductSort::Ctime => "created_at DESC, id DESC",
            ProductSort::Oldest => "created_at ASC, id ASC",
        };
        let sql = format!(
            "SELECT {COLUMNS} FROM products \
             WHERE is_published = TRUE \
               AND ($1::uuid IS NULL OR shop_id = $1) \
               AND ($2::uuid[] IS NULL OR id = ANY($2)) \
             ORDER BY {order} LIMIT $3 OFFSET $4"
        );
        let records = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(filter.shop_id)
            .bind(filter.ids.clone())
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        into_products(records)
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn search_published(&self, key: &str) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM products \
             WHERE is_published = TRUE AND (name ILIKE $1 OR description ILIKE $1) \
             ORDER BY created_at DESC, id DESC"
        );
        let records =
            sqlx::query_as::<_, ProductRecord>(&sql).bind(like_pattern(key)).fetch_all(&self.pool).await?;
        into_products(records)
    }
}
