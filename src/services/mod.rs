pub mod access_service;
pub mod api_key_service;
pub mod cart_service;
pub mod discount_service;
pub mod health_service;
pub mod product_service;
pub mod session_service;
pub mod token_service;
