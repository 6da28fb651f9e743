pub mod access;
pub mod cart;
pub mod discount;
pub mod health;
pub mod product;
