//! Discount codes and the rules that turn an order into a price adjustment.
//!
//! Amounts are integers in minor currency units. Percentage values are whole
//! percents in `[0, 100]`.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    FixedAmount,
    Percentage,
}

impl DiscountType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FixedAmount => "fixed_amount",
            Self::Percentage => "percentage",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fixed_amount" => Some(Self::FixedAmount),
            "percentage" => Some(Self::Percentage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliesTo {
    All,
    Specific,
}

impl AppliesTo {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Specific => "specific",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "specific" => Some(Self::Specific),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCode {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub description: String,
    pub code: String,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub value: i64,
    pub max_value: Option<i64>,
    pub min_order_value: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    /// Remaining redemptions. Zero means exhausted.
    pub max_uses: i64,
    pub uses_count: i64,
    /// Zero disables the per-user cap.
    pub max_uses_per_user: i64,
    pub users_used: BTreeMap<Uuid, i64>,
    pub is_active: bool,
    pub applies_to: AppliesTo,
    pub product_ids: Vec<Uuid>,
}

/// A line of an order as presented for discount evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i64,
    pub price: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjustment {
    pub order_total: i64,
    pub discount_amount: i64,
    pub final_total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscountRejection {
    #[error("Discount is expired")]
    Inactive,
    #[error("Discount is expired")]
    OutsideWindow,
    #[error("Discount is exhausted")]
    Exhausted,
    #[error("Discount requires a minimum order value of {minimum}")]
    BelowMinimum { minimum: i64 },
    #[error("Discount has reached the maximum uses for this user")]
    UserLimitReached,
    #[error("Order lines must have a non-negative quantity and price")]
    InvalidLine,
    #[error("Order total is out of range")]
    Overflow,
}

impl From<DiscountRejection> for AppError {
    fn from(rejection: DiscountRejection) -> Self {
        match rejection {
            DiscountRejection::InvalidLine | DiscountRejection::Overflow => Self::BadRequest(rejection.to_string()),
            _ => Self::NotFound(rejection.to_string()),
        }
    }
}

impl DiscountCode {
    #[must_use]
    pub fn uses_by(&self, user_id: Uuid) -> i64 {
        self.users_used.get(&user_id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_within_window(&self, now: OffsetDateTime) -> bool {
        self.start_date <= now && now <= self.end_date
    }

    /// Checks the code-level conditions for any redemption: active, not exhausted, inside its window.
    ///
    /// # Errors
    /// Returns the first violated condition.
    pub fn ensure_available(&self, now: OffsetDateTime) -> Result<(), DiscountRejection> {
        if !self.is_active {
            return Err(DiscountRejection::Inactive);
        }
        if self.max_uses <= 0 {
            return Err(DiscountRejection::Exhausted);
        }
        if !self.is_within_window(now) {
            return Err(DiscountRejection::OutsideWindow);
        }
        Ok(())
    }

    /// # Errors
    /// Returns `UserLimitReached` when a per-user cap is set and `user_id` has reached it.
    pub fn ensure_user_allowance(&self, user_id: Uuid) -> Result<(), DiscountRejection> {
        if self.max_uses_per_user > 0 && self.uses_by(user_id) >= self.max_uses_per_user {
            return Err(DiscountRejection::UserLimitReached);
        }
        Ok(())
    }

    /// Computes the adjustment this code grants on `lines`.
    ///
    /// The lines are trusted to already be restricted to the code's product scope.
    ///
    /// # Errors
    /// Returns a `DiscountRejection` describing the first rule the order violates.
    pub fn compute_adjustment(
        &self,
        user_id: Uuid,
        lines: &[OrderLine],
        now: OffsetDateTime,
    ) -> Result<Adjustment, DiscountRejection> {
        if self.max_uses <= 0 {
            return Err(DiscountRejection::Exhausted);
        }
        if !self.is_within_window(now) {
            return Err(DiscountRejection::OutsideWindow);
        }

        let order_total = order_total(lines)?;

        if self.min_order_value > 0 && order_total < self.min_order_value {
            return Err(DiscountRejection::BelowMinimum { minimum: self.min_order_value });
        }

        self.ensure_user_allowance(user_id)?;

        let discount_amount = self.discount_amount(order_total);

        Ok(Adjustment { order_total, discount_amount, final_total: order_total - discount_amount })
    }

    fn discount_amount(&self, order_total: i64) -> i64 {
        match self.discount_type {
            DiscountType::FixedAmount => self.value,
            DiscountType::Percentage => {
                let raw = i128::from(order_total) * i128::from(self.value) / 100;
                // value is bounded to [0, 100] so raw never exceeds order_total
                let raw = i64::try_from(raw).unwrap_or(order_total);
                match self.max_value {
                    Some(cap) if cap > 0 => raw.min(cap),
                    _ => raw,
                }
            }
        }
    }

    /// Applies the provided fields of `patch`, leaving counters and ownership untouched.
    pub fn apply_patch(&mut self, patch: &DiscountPatch) {
        if let Some(code) = &patch.code {
            self.code.clone_from(code);
        }
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(discount_type) = patch.discount_type {
            self.discount_type = discount_type;
        }
        if let Some(value) = patch.value {
            self.value = value;
        }
        if let Some(max_value) = patch.max_value {
            self.max_value = Some(max_value);
        }
        if let Some(min_order_value) = patch.min_order_value {
            self.min_order_value = min_order_value;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(max_uses) = patch.max_uses {
            self.max_uses = max_uses;
        }
        if let Some(max_uses_per_user) = patch.max_uses_per_user {
            self.max_uses_per_user = max_uses_per_user;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if let Some(applies_to) = patch.applies_to {
            self.applies_to = applies_to;
        }
        if let Some(product_ids) = &patch.product_ids {
            self.product_ids.clone_from(product_ids);
        }
        if self.applies_to == AppliesTo::All {
            self.product_ids.clear();
        }
    }

    /// Applies one redemption by `user_id` if the guards hold. Returns `false` and leaves `self`
    /// untouched otherwise. Stores call this under their own per-record lock.
    pub fn try_redeem(&mut self, user_id: Uuid, now: OffsetDateTime) -> bool {
        if self.ensure_available(now).is_err() || self.ensure_user_allowance(user_id).is_err() {
            return false;
        }
        self.max_uses -= 1;
        self.uses_count += 1;
        *self.users_used.entry(user_id).or_insert(0) += 1;
        true
    }

    /// Reverses one redemption by `user_id`. Returns `false` if the user has none on record.
    pub fn try_cancel(&mut self, user_id: Uuid) -> bool {
        let Some(count) = self.users_used.get_mut(&user_id) else {
            return false;
        };
        *count -= 1;
        if *count <= 0 {
            self.users_used.remove(&user_id);
        }
        self.max_uses += 1;
        self.uses_count = (self.uses_count - 1).max(0);
        true
    }
}

/// Sums `quantity * price` over `lines`.
///
/// # Errors
/// Rejects negative quantities or prices and totals that overflow.
pub fn order_total(lines: &[OrderLine]) -> Result<i64, DiscountRejection> {
    lines.iter().try_fold(0i64, |acc, line| {
        if line.quantity < 0 || line.price < 0 {
            return Err(DiscountRejection::InvalidLine);
        }
        line.quantity
            .checked_mul(line.price)
            .and_then(|subtotal| acc.checked_add(subtotal))
            .ok_or(DiscountRejection::Overflow)
    })
}

#[derive(Debug, Clone)]
pub struct NewDiscount {
    pub shop_id: Uuid,
    pub name: String,
    pub description: String,
    pub code: String,
    pub discount_type: DiscountType,
    pub value: i64,
    pub max_value: Option<i64>,
    pub min_order_value: i64,
    pub start_date: OffsetDateTime,
    pub end_date: OffsetDateTime,
    pub max_uses: i64,
    pub uses_count: i64,
    pub max_uses_per_user: i64,
    pub is_active: bool,
    pub applies_to: AppliesTo,
    pub product_ids: Vec<Uuid>,
}

impl NewDiscount {
    /// Checks the field-level rules shared by creation and update.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` describing the violated rule.
    pub fn validate(&self) -> Result<(), AppError> {
        validate_fields(
            &self.code,
            self.discount_type,
            self.value,
            self.max_value,
            self.min_order_value,
            self.start_date,
            self.end_date,
            self.max_uses,
            self.max_uses_per_user,
        )
    }

    pub fn normalize(&mut self) {
        self.code = self.code.trim().to_string();
        if self.applies_to == AppliesTo::All {
            self.product_ids.clear();
        }
    }

    #[must_use]
    pub fn into_discount(self, id: Uuid) -> DiscountCode {
        DiscountCode {
            id,
            shop_id: self.shop_id,
            name: self.name,
            description: self.description,
            code: self.code,
            discount_type: self.discount_type,
            value: self.value,
            max_value: self.max_value,
            min_order_value: self.min_order_value,
            start_date: self.start_date,
            end_date: self.end_date,
            max_uses: self.max_uses,
            uses_count: self.uses_count,
            max_uses_per_user: self.max_uses_per_user,
            users_used: BTreeMap::new(),
            is_active: self.is_active,
            applies_to: self.applies_to,
            product_ids: self.product_ids,
        }
    }
}

impl DiscountCode {
    /// # Errors
    /// Returns `AppError::BadRequest` describing the violated rule.
    pub fn validate(&self) -> Result<(), AppError> {
        validate_fields(
            &self.code,
            self.discount_type,
            self.value,
            self.max_value,
            self.min_order_value,
            self.start_date,
            self.end_date,
            self.max_uses,
            self.max_uses_per_user,
        )
    }
}

#[allow(clippy::too_many_arguments)]
fn validate_fields(
    code: &str,
    discount_type: DiscountType,
    value: i64,
    max_value: Option<i64>,
    min_order_value: i64,
    start_date: OffsetDateTime,
    end_date: OffsetDateTime,
    max_uses: i64,
    max_uses_per_user: i64,
) -> Result<(), AppError> {
    if code.trim().is_empty() {
        return Err(AppError::bad_request("Discount code must not be empty"));
    }
    if start_date >= end_date {
        return Err(AppError::bad_request("Start date must be before end date"));
    }
    if value < 0 {
        return Err(AppError::bad_request("Discount value must not be negative"));
    }
    if discount_type == DiscountType::Percentage && value > 100 {
        return Err(AppError::bad_request("Percentage discount must be between 0 and 100"));
    }
    if max_value.is_some_and(|cap| cap < 0) {
        return Err(AppError::bad_request("Maximum discount value must not be negative"));
    }
    if min_order_value < 0 || max_uses < 0 || max_uses_per_user < 0 {
        return Err(AppError::bad_request("Limits must not be negative"));
    }
    Ok(())
}

/// Fields a shop may change on an existing code. `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct DiscountPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub value: Option<i64>,
    pub max_value: Option<i64>,
    pub min_order_value: Option<i64>,
    pub start_date: Option<OffsetDateTime>,
    pub end_date: Option<OffsetDateTime>,
    pub max_uses: Option<i64>,
    pub max_uses_per_user: Option<i64>,
    pub is_active: Option<bool>,
    pub applies_to: Option<AppliesTo>,
    pub product_ids: Option<Vec<Uuid>>,
}
