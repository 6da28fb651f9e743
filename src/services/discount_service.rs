use crate::domain::Page;
use crate::domain::discount::{Adjustment, AppliesTo, DiscountCode, DiscountPatch, NewDiscount, OrderLine};
use crate::domain::product::{Product, ProductSort};
use crate::error::{AppError, Result};
use crate::storage::{DiscountStore, ProductFilter, ProductStore};
use opentelemetry::{global, metrics::Counter};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

const MISSING: &str = "Discount is not exists!";

#[derive(Clone, Debug)]
struct Metrics {
    redemptions_total: Counter<u64>,
    cancellations_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("storefront-server");
        Self {
            redemptions_total: meter
                .u64_counter("storefront_discount_redemptions_total")
                .with_description("Total number of discount codes redeemed")
                .build(),
            cancellations_total: meter
                .u64_counter("storefront_discount_cancellations_total")
                .with_description("Total number of discount redemptions cancelled")
                .build(),
        }
    }
}

/// Discount administration and the redemption rule engine.
#[derive(Clone, Debug)]
pub struct DiscountService {
    discounts: Arc<dyn DiscountStore>,
    products: Arc<dyn ProductStore>,
    metrics: Metrics,
}

impl DiscountService {
    #[must_use]
    pub fn new(discounts: Arc<dyn DiscountStore>, products: Arc<dyn ProductStore>) -> Self {
        Self { discounts, products, metrics: Metrics::new() }
    }

    /// Creates a code for the shop. An inactive code with the same name is replaced.
    ///
    /// # Errors
    /// `BadRequest` for invalid fields or when an active code with the same name exists.
    #[tracing::instrument(skip(self, discount), fields(shop_id = %discount.shop_id), err(level = "warn"))]
    pub async fn create(&self, mut discount: NewDiscount) -> Result<DiscountCode> {
        discount.normalize();
        discount.validate()?;
        self.discounts.insert(discount).await.map_err(conflict_as_bad_request)
    }

    /// Applies the provided fields to a code owned by `shop_id`.
    ///
    /// # Errors
    /// `NotFound` if the code does not exist, `BadRequest` if it belongs to another shop or the
    /// result breaks a field rule.
    #[tracing::instrument(skip(self, patch), err(level = "warn"))]
    pub async fn update(&self, shop_id: Uuid, id: Uuid, mut patch: DiscountPatch) -> Result<DiscountCode> {
        if let (Some(start), Some(end)) = (patch.start_date, patch.end_date) {
            if start >= end {
                return Err(AppError::bad_request("Start date must be before end date"));
            }
            if end < OffsetDateTime::now_utc() {
                return Err(AppError::bad_request("Discount code has expired"));
            }
        }
        if let Some(code) = patch.code.as_mut() {
            *code = code.trim().to_string();
        }

        let existing = self.discounts.find_by_id(id).await?.ok_or_else(|| AppError::not_found("Discount not found"))?;
        if existing.shop_id != shop_id {
            return Err(AppError::bad_request("Discount does not belong to the specified shop"));
        }

        let mut preview = existing;
        preview.apply_patch(&patch);
        preview.validate()?;

        self.discounts
            .update(id, &patch)
            .await
            .map_err(conflict_as_bad_request)?
            .ok_or_else(|| AppError::not_found("Discount not found"))
    }

    /// Looks up a code that can currently be offered.
    ///
    /// # Errors
    /// `NotFound` if the code does not exist or is inactive.
    pub async fn validate_for_redemption(&self, code: &str, shop_id: Uuid) -> Result<DiscountCode> {
        match self.discounts.find_by_code(shop_id, code).await? {
            Some(discount) if discount.is_active => Ok(discount),
            _ => Err(AppError::not_found(MISSING)),
        }
    }

    /// The published products a code can be applied to.
    ///
    /// # Errors
    /// `NotFound` if the code does not exist or is inactive.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn list_products_for_code(&self, code: &str, shop_id: Uuid, page: Page) -> Result<Vec<Product>> {
        let discount = self.validate_for_redemption(code, shop_id).await?;
        let filter = match discount.applies_to {
            AppliesTo::All => ProductFilter { shop_id: Some(shop_id), ids: None },
            AppliesTo::Specific => ProductFilter { shop_id: None, ids: Some(discount.product_ids) },
        };
        self.products.list_published(&filter, ProductSort::Ctime, page).await
    }

    /// # Errors
    /// Returns `AppError::Database` if the lookup fails.
    pub async fn list_codes_for_shop(&self, shop_id: Uuid, page: Page) -> Result<Vec<DiscountCode>> {
        self.discounts.list_active_for_shop(shop_id, page).await
    }

    /// Prices an order against a code without consuming it.
    ///
    /// Lines outside a `specific` code's product list do not count towards the order.
    ///
    /// # Errors
    /// `NotFound` when the code is unknown or rejects the order, `BadRequest` for malformed lines.
    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()), err(level = "debug"))]
    pub async fn get_discount_amount(
        &self,
        code: &str,
        shop_id: Uuid,
        user_id: Uuid,
        lines: &[OrderLine],
    ) -> Result<Adjustment> {
        let discount = self.validate_for_redemption(code, shop_id).await?;
        let eligible: Vec<OrderLine> = match discount.applies_to {
            AppliesTo::All => lines.to_vec(),
            AppliesTo::Specific => {
                lines.iter().filter(|line| discount.product_ids.contains(&line.product_id)).copied().collect()
            }
        };
        Ok(discount.compute_adjustment(user_id, &eligible, OffsetDateTime::now_utc())?)
    }

    /// Consumes one use of the code for `user_id`.
    ///
    /// # Errors
    /// `NotFound` naming the first rule that blocked the redemption.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn redeem(&self, code: &str, shop_id: Uuid, user_id: Uuid) -> Result<DiscountCode> {
        let now = OffsetDateTime::now_utc();
        if let Some(discount) = self.discounts.redeem(shop_id, code, user_id, now).await? {
            self.metrics.redemptions_total.add(1, &[]);
            return Ok(discount);
        }

        // The guarded update refused; re-read to report why.
        let discount = self.validate_for_redemption(code, shop_id).await?;
        discount.ensure_available(now)?;
        discount.ensure_user_allowance(user_id)?;
        Err(AppError::not_found("Discount is exhausted"))
    }

    /// Gives back one use the user previously redeemed.
    ///
    /// # Errors
    /// `NotFound` if the code does not exist or the user never redeemed it.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn cancel(&self, code: &str, shop_id: Uuid, user_id: Uuid) -> Result<DiscountCode> {
        if let Some(discount) = self.discounts.cancel(shop_id, code, user_id).await? {
            self.metrics.cancellations_total.add(1, &[]);
            return Ok(discount);
        }
        match self.discounts.find_by_code(shop_id, code).await? {
            None => Err(AppError::not_found(MISSING)),
            Some(_) => Err(AppError::not_found("Discount has not been used by this user")),
        }
    }

    /// # Errors
    /// `NotFound` if the shop has no such code.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn delete(&self, shop_id: Uuid, code: &str) -> Result<DiscountCode> {
        self.discounts.delete(shop_id, code).await?.ok_or_else(|| AppError::not_found(MISSING))
    }
}

fn conflict_as_bad_request(error: AppError) -> AppError {
    match error {
        AppError::Conflict(message) => AppError::BadRequest(message),
        other => other,
    }
}
