use crate::domain::cart::{Cart, CartItem, CartState};
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub(crate) struct CartRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub state: String,
}

#[derive(sqlx::FromRow)]
pub(crate) struct CartItemRecord {
    pub product_id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
}

impl From<CartItemRecord> for CartItem {
    fn from(record: CartItemRecord) -> Self {
        Self {
            product_id: record.product_id,
            shop_id: record.shop_id,
            name: record.name,
            price: record.price,
            quantity: record.quantity,
        }
    }
}

impl CartRecord {
    pub(crate) fn into_cart(self, items: Vec<CartItemRecord>) -> Cart {
        let products: Vec<CartItem> = items.into_iter().map(CartItem::from).collect();
        Cart {
            id: self.id,
            user_id: self.user_id,
            state: CartState::parse(&self.state),
            count_products: products.len(),
            products,
        }
    }
}
