//! Coupon model.

use rust_decimal::Decimal;
use serde::Serialize;

use aperture_core::CouponId;

/// A flat-amount discount code.
///
/// No expiry, no usage limit, no per-user restriction.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    /// Amount subtracted from the cart total, in the currency's major unit.
    pub amount: Decimal,
}
