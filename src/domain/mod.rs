pub mod api_key;
pub mod auth;
pub mod cart;
pub mod discount;
pub mod product;
pub mod session;
pub mod shop;

use serde::Deserialize;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

/// One-based page selection for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Page {
    pub limit: i64,
    pub page: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: DEFAULT_LIMIT, page: 1 }
    }
}

impl Page {
    #[must_use]
    pub fn new(limit: i64, page: i64) -> Self {
        Self { limit, page }.clamped()
    }

    #[must_use]
    pub fn clamped(self) -> Self {
        Self { limit: self.limit.clamp(1, MAX_LIMIT), page: self.page.max(1) }
    }

    #[must_use]
    pub const fn offset(self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    #[must_use]
    pub fn slice<T: Clone>(self, items: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(0);
        let limit = usize::try_from(self.limit).unwrap_or(0);
        items.iter().skip(start).take(limit).cloned().collect()
    }
}
