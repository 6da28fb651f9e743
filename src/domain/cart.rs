use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartState {
    Active,
    Completed,
    Failed,
    Pending,
}

impl CartState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Pending => "pending",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "pending" => Self::Pending,
            _ => Self::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub state: CartState,
    pub products: Vec<CartItem>,
    pub count_products: usize,
}

impl Cart {
    #[must_use]
    pub fn new(user_id: Uuid) -> Self {
        Self { id: Uuid::new_v4(), user_id, state: CartState::Active, products: Vec::new(), count_products: 0 }
    }

    /// Adds `item`, or increments the quantity of the line already holding the product.
    pub fn add(&mut self, item: CartItem) {
        match self.products.iter_mut().find(|p| p.product_id == item.product_id) {
            Some(existing) => existing.quantity += item.quantity,
            None => self.products.push(item),
        }
        self.count_products = self.products.len();
    }

    /// Adjusts the quantity of an existing line. Returns the new quantity, or `None` if absent.
    pub fn adjust(&mut self, product_id: Uuid, delta: i64) -> Option<i64> {
        let line = self.products.iter_mut().find(|p| p.product_id == product_id)?;
        line.quantity += delta;
        Some(line.quantity)
    }

    pub fn remove(&mut self, product_id: Uuid) -> bool {
        let before = self.products.len();
        self.products.retain(|p| p.product_id != product_id);
        self.count_products = self.products.len();
        before != self.products.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: Uuid, quantity: i64) -> CartItem {
        CartItem { product_id, shop_id: Uuid::new_v4(), name: "Lamp".into(), price: 1_500, quantity }
    }

    #[test]
    fn test_add_merges_same_product() {
        let product = Uuid::new_v4();
        let mut cart = Cart::new(Uuid::new_v4());

        cart.add(item(product, 1));
        cart.add(item(product, 2));
        cart.add(item(Uuid::new_v4(), 1));

        assert_eq!(cart.count_products, 2);
        assert_eq!(cart.products[0].quantity, 3);
    }

    #[test]
    fn test_adjust_and_remove() {
        let product = Uuid::new_v4();
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add(item(product, 4));

        assert_eq!(cart.adjust(product, -1), Some(3));
        assert_eq!(cart.adjust(Uuid::new_v4(), 1), None);
        assert!(cart.remove(product));
        assert!(!cart.remove(product));
        assert_eq!(cart.count_products, 0);
    }
}
