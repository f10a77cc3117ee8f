//! Cart and cart line models, plus total computation.
//!
//! A cart is the user's single unordered order. It transitions to the
//! terminal ordered state exactly once, at successful payment.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use aperture_core::{AddressId, CartId, CartLineId, CouponId, PaymentId, PhotoId, UserId};

/// A user's order. `ordered = false` means it is the active cart.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub ordered: bool,
    pub being_delivered: bool,
    pub received: bool,
    /// Human-readable reference stamped at finalization.
    pub ref_code: Option<String>,
    pub coupon_id: Option<CouponId>,
    pub shipping_address_id: Option<AddressId>,
    pub billing_address_id: Option<AddressId>,
    pub payment_id: Option<PaymentId>,
    pub started_at: DateTime<Utc>,
    pub ordered_at: Option<DateTime<Utc>>,
}

impl Cart {
    /// Whether both address slots were resolved during checkout.
    ///
    /// The payment page refuses to serve until this holds.
    #[must_use]
    pub const fn addresses_complete(&self) -> bool {
        self.shipping_address_id.is_some() && self.billing_address_id.is_some()
    }
}

/// A (photo, quantity) pairing within a cart.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartLineId,
    pub cart_id: CartId,
    pub photo_id: PhotoId,
    pub user_id: UserId,
    pub quantity: i32,
    /// Mirrors the parent cart's state; flips in lockstep at finalization.
    pub ordered: bool,
}

/// A cart line joined with the pricing columns of its photo.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PricedLine {
    pub id: CartLineId,
    pub photo_id: PhotoId,
    pub slug: String,
    pub description: String,
    pub quantity: i32,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
}

impl PricedLine {
    /// Discount price when present, else list price.
    #[must_use]
    pub fn effective_unit_price(&self) -> Decimal {
        self.discount_price.unwrap_or(self.price)
    }

    /// Line total at the effective unit price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.effective_unit_price() * Decimal::from(self.quantity)
    }
}

/// Cart total: sum of line totals minus the coupon amount, if any.
///
/// Not floored at zero; the charge amount clamps separately so a display
/// total can show the over-discount.
#[must_use]
pub fn cart_total(lines: &[PricedLine], coupon_amount: Option<Decimal>) -> Decimal {
    let subtotal: Decimal = lines.iter().map(PricedLine::line_total).sum();
    subtotal - coupon_amount.unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i32, price: i64, discount: Option<i64>) -> PricedLine {
        PricedLine {
            id: CartLineId::new(0),
            photo_id: PhotoId::new(0),
            slug: "p".to_owned(),
            description: "p".to_owned(),
            quantity,
            price: Decimal::new(price, 0),
            discount_price: discount.map(|d| Decimal::new(d, 0)),
        }
    }

    #[test]
    fn test_line_total_uses_effective_price() {
        assert_eq!(line(2, 10, None).line_total(), Decimal::new(20, 0));
        assert_eq!(line(3, 20, Some(15)).line_total(), Decimal::new(45, 0));
    }

    #[test]
    fn test_cart_total_with_coupon() {
        // (10 x 2 + 15 x 1) - 5 = 30
        let lines = vec![line(2, 10, None), line(1, 20, Some(15))];
        let total = cart_total(&lines, Some(Decimal::new(5, 0)));
        assert_eq!(total, Decimal::new(30, 0));
    }

    #[test]
    fn test_cart_total_without_coupon() {
        let lines = vec![line(2, 10, None)];
        assert_eq!(cart_total(&lines, None), Decimal::new(20, 0));
    }

    #[test]
    fn test_cart_total_can_go_negative() {
        let lines = vec![line(1, 10, None)];
        let total = cart_total(&lines, Some(Decimal::new(25, 0)));
        assert_eq!(total, Decimal::new(-15, 0));
    }

    #[test]
    fn test_empty_cart_total() {
        assert_eq!(cart_total(&[], None), Decimal::ZERO);
    }

    #[test]
    fn test_addresses_complete() {
        let mut cart = Cart {
            id: CartId::new(1),
            user_id: UserId::new(1),
            ordered: false,
            being_delivered: false,
            received: false,
            ref_code: None,
            coupon_id: None,
            shipping_address_id: Some(AddressId::new(1)),
            billing_address_id: None,
            payment_id: None,
            started_at: Utc::now(),
            ordered_at: None,
        };
        assert!(!cart.addresses_complete());
        cart.billing_address_id = Some(AddressId::new(2));
        assert!(cart.addresses_complete());
    }
}
