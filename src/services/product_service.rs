use crate::domain::Page;
use crate::domain::product::{NewProduct, Product, ProductPatch, ProductSort};
use crate::error::{AppError, Result};
use crate::storage::{ProductFilter, ProductStore};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct ProductService {
    products: Arc<dyn ProductStore>,
}

impl ProductService {
    #[must_use]
    pub fn new(products: Arc<dyn ProductStore>) -> Self {
        Self { products }
    }

    /// New products start as drafts.
    ///
    /// # Errors
    /// `BadRequest` if a field rule is broken.
    #[tracing::instrument(skip(self, product), fields(shop_id = %product.shop_id), err(level = "warn"))]
    pub async fn create_product(&self, product: NewProduct) -> Result<Product> {
        product.validate()?;
        self.products.insert(product).await
    }

    /// # Errors
    /// `NotFound` unless the product exists and belongs to `shop_id`; `BadRequest` for invalid fields.
    #[tracing::instrument(skip(self, patch), err(level = "warn"))]
    pub async fn update_product(&self, shop_id: Uuid, id: Uuid, patch: ProductPatch) -> Result<Product> {
        let mut product = self
            .products
            .find_by_id(id)
            .await?
            .filter(|product| product.shop_id == shop_id)
            .ok_or_else(|| AppError::not_found("Product not found"))?;
        product.apply_patch(&patch)?;
        self.products.update(&product).await?.ok_or_else(|| AppError::not_found("Product not found"))
    }

    /// # Errors
    /// `NotFound` unless the product exists and belongs to `shop_id`.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn publish(&self, shop_id: Uuid, id: Uuid) -> Result<()> {
        self.set_published(shop_id, id, true).await
    }

    /// # Errors
    /// `NotFound` unless the product exists and belongs to `shop_id`.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn unpublish(&self, shop_id: Uuid, id: Uuid) -> Result<()> {
        self.set_published(shop_id, id, false).await
    }

    async fn set_published(&self, shop_id: Uuid, id: Uuid, published: bool) -> Result<()> {
        if self.products.set_published(shop_id, id, published).await? {
            Ok(())
        } else {
            Err(AppError::not_found("Product not found"))
        }
    }

    /// # Errors
    /// Returns `AppError::Database` if the lookup fails.
    pub async fn find_all_drafts_for_shop(&self, shop_id: Uuid, page: Page) -> Result<Vec<Product>> {
        self.products.list_for_shop(shop_id, false, page).await
    }

    /// # Errors
    /// Returns `AppError::Database` if the lookup fails.
    pub async fn find_all_published_for_shop(&self, shop_id: Uuid, page: Page) -> Result<Vec<Product>> {
        self.products.list_for_shop(shop_id, true, page).await
    }

    /// # Errors
    /// `BadRequest` for an empty key.
    pub async fn search(&self, key: &str) -> Result<Vec<Product>> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AppError::bad_request("Search key must not be empty"));
        }
        self.products.search_published(key).await
    }

    /// # Errors
    /// Returns `AppError::Database` if the lookup fails.
    pub async fn find_all_products(&self, sort: ProductSort, page: Page) -> Result<Vec<Product>> {
        self.products.list_published(&ProductFilter::default(), sort, page).await
    }

    /// Only published products are visible here.
    ///
    /// # Errors
    /// `NotFound` if no published product has this id.
    pub async fn find_product(&self, id: Uuid) -> Result<Product> {
        self.products
            .find_by_id(id)
            .await?
            .filter(|product| product.is_published)
            .ok_or_else(|| AppError::not_found("Product not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory;
    use crate::domain::product::{GoodsAttributes, ProductDetails};
    use serde_json::json;

    fn service() -> ProductService {
        ProductService::new(memory::stores().products)
    }

    fn sofa(shop_id: Uuid) -> NewProduct {
        NewProduct {
            shop_id,
            name: "Corner Sofa".into(),
            thumb: "sofa.png".into(),
            description: "Grey linen corner sofa".into(),
            price: 89_900,
            quantity: 3,
            details: ProductDetails::Furniture(GoodsAttributes {
                brand: "Nord".into(),
                size: Some("L".into()),
                material: Some("linen".into()),
            }),
        }
    }

    #[tokio::test]
    async fn test_publish_lifecycle() {
        let service = service();
        let shop_id = Uuid::new_v4();
        let product = service.create_product(sofa(shop_id)).await.unwrap();

        assert!(matches!(service.find_product(product.id).await, Err(AppError::NotFound(_))));
        assert_eq!(service.find_all_drafts_for_shop(shop_id, Page::default()).await.unwrap().len(), 1);

        assert!(matches!(service.publish(Uuid::new_v4(), product.id).await, Err(AppError::NotFound(_))));
        service.publish(shop_id, product.id).await.unwrap();
        assert!(service.find_product(product.id).await.unwrap().is_published);
        assert!(service.find_all_drafts_for_shop(shop_id, Page::default()).await.unwrap().is_empty());
        assert_eq!(service.find_all_published_for_shop(shop_id, Page::default()).await.unwrap().len(), 1);

        service.unpublish(shop_id, product.id).await.unwrap();
        assert!(service.find_all_products(ProductSort::Ctime, Page::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_attributes() {
        let service = service();
        let shop_id = Uuid::new_v4();
        let product = service.create_product(sofa(shop_id)).await.unwrap();

        let patch = ProductPatch {
            name: Some("Corner Sofa XL".into()),
            attributes: Some(json!({ "size": "XL", "material": null })),
            ..ProductPatch::default()
        };
        let updated = service.update_product(shop_id, product.id, patch.clone()).await.unwrap();

        assert_eq!(updated.slug, "corner-sofa-xl");
        assert_eq!(
            updated.details,
            ProductDetails::Furniture(GoodsAttributes {
                brand: "Nord".into(),
                size: Some("XL".into()),
                material: Some("linen".into()),
            })
        );
        assert!(matches!(service.update_product(Uuid::new_v4(), product.id, patch).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_search_published_only() {
        let service = service();
        let shop_id = Uuid::new_v4();
        let published = service.create_product(sofa(shop_id)).await.unwrap();
        service.publish(shop_id, published.id).await.unwrap();
        service.create_product(sofa(shop_id)).await.unwrap();

        let hits = service.search("LINEN").await.unwrap();
        assert_eq!(hits.iter().map(|p| p.id).collect::<Vec<_>>(), vec![published.id]);
        assert!(matches!(service.search("  ").await, Err(AppError::BadRequest(_))));
    }
}
