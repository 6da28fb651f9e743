use crate::domain::Page;
use crate::domain::product::{NewProduct, Product, ProductSort};
use crate::error::Result;
use crate::storage::{ProductFilter, ProductStore};
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryProductStore {
    products: DashMap<Uuid, Product>,
}

impl MemoryProductStore {
    fn collect(&self, predicate: impl Fn(&Product) -> bool, sort: ProductSort) -> Vec<Product> {
        let mut products: Vec<Product> =
            self.products.iter().filter(|p| predicate(p.value())).map(|p| p.value().clone()).collect();
        match sort {
            ProductSort::Ctime => products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))),
            ProductSort::Oldest => products.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))),
        }
        products
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert(&self, product: NewProduct) -> Result<Product> {
        let product = product.into_product(Uuid::new_v4());
        self.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.products.get(&id).map(|p| p.value().clone()))
    }

    async fn update(&self, product: &Product) -> Result<Option<Product>> {
        Ok(self.products.get_mut(&product.id).filter(|existing| existing.shop_id == product.shop_id).map(
            |mut existing| {
                let is_draft = existing.is_draft;
                let is_published = existing.is_published;
                let created_at = existing.created_at;
                *existing = Product { is_draft, is_published, created_at, ..product.clone() };
                existing.value().clone()
            },
        ))
    }

    async fn set_published(&self, shop_id: Uuid, id: Uuid, published: bool) -> Result<bool> {
        let Some(mut product) = self.products.get_mut(&id) else {
            return Ok(false);
        };
        if product.shop_id != shop_id {
            return Ok(false);
        }
        product.is_published = published;
        product.is_draft = !published;
        Ok(true)
    }

    async fn list_for_shop(&self, shop_id: Uuid, published: bool, page: Page) -> Result<Vec<Product>> {
        let products = self.collect(|p| p.shop_id == shop_id && p.is_published == published, ProductSort::Ctime);
        Ok(page.slice(&products))
    }

    async fn list_published(&self, filter: &ProductFilter, sort: ProductSort, page: Page) -> Result<Vec<Product>> {
        let products = self.collect(
            |p| {
                p.is_published
                    && filter.shop_id.is_none_or(|shop_id| p.shop_id == shop_id)
                    && filter.ids.as_ref().is_none_or(|ids| ids.contains(&p.id))
            },
            sort,
        );
        Ok(page.slice(&products))
    }

    async fn search_published(&self, key: &str) -> Result<Vec<Product>> {
        let needle = key.to_lowercase();
        Ok(self.collect(
            |p| {
                p.is_published
                    && (p.name.to_lowercase().contains(&needle) || p.description.to_lowercase().contains(&needle))
            },
            ProductSort::Ctime,
        ))
    }
}
