mod cart;
mod discount;
mod key_token;
mod product;
mod shop;

pub(crate) use cart::{CartItemRecord, CartRecord};
pub(crate) use discount::DiscountRecord;
pub(crate) use key_token::KeyTokenRecord;
pub(crate) use product::ProductRecord;
pub(crate) use shop::{ApiKeyRecord, ShopRecord};
