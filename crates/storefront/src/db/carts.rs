//! Cart repository.
//!
//! The "at most one active cart per user" and "one line per (cart, photo)"
//! rules are partial unique indexes, so add-to-cart is a pair of
//! `ON CONFLICT` upserts inside one transaction instead of a racy
//! read-then-write.

use rust_decimal::Decimal;
use sqlx::PgPool;

use aperture_core::{AddressId, CartId, CouponId, PhotoId, UserId};

use super::RepositoryError;
use crate::models::{AddressKind, Cart, Coupon, Payment, PricedLine};

/// Result of adding a photo to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line was attached with quantity 1.
    Added,
    /// The existing line's quantity was incremented.
    QuantityBumped,
}

/// Result of decrementing a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// Quantity was reduced by one; the line remains attached.
    Decremented,
    /// Quantity was 1, so the line was removed entirely.
    Removed,
}

const CART_COLUMNS: &str = r"
    SELECT id, user_id, ordered, being_delivered, received, ref_code,
           coupon_id, shipping_address_id, billing_address_id, payment_id,
           started_at, ordered_at
    FROM carts
";

/// Repository for cart and line operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's active (unordered) cart, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_for(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let cart = sqlx::query_as::<_, Cart>(&format!(
            "{CART_COLUMNS} WHERE user_id = $1 AND NOT ordered"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(cart)
    }

    /// The lines of a cart joined with photo pricing, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn priced_lines(&self, cart_id: CartId) -> Result<Vec<PricedLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, PricedLine>(
            r"
            SELECT l.id, l.photo_id, p.slug, p.description, l.quantity,
                   p.price, p.discount_price
            FROM cart_lines l
            JOIN photos p ON p.id = l.photo_id
            WHERE l.cart_id = $1
            ORDER BY l.id
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// The coupon attached to a cart, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn coupon_for(&self, cart: &Cart) -> Result<Option<Coupon>, RepositoryError> {
        let Some(coupon_id) = cart.coupon_id else {
            return Ok(None);
        };

        let coupon =
            sqlx::query_as::<_, Coupon>("SELECT id, code, amount FROM coupons WHERE id = $1")
                .bind(coupon_id)
                .fetch_optional(self.pool)
                .await?;

        Ok(coupon)
    }

    /// Add a photo to the user's active cart, creating the cart if needed.
    ///
    /// Both the cart and the line are upserted inside one transaction; a
    /// repeated add increments the existing line's quantity by one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn add_photo(
        &self,
        user_id: UserId,
        photo_id: PhotoId,
    ) -> Result<AddOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Get-or-create the active cart against the partial unique index.
        sqlx::query(
            r"
            INSERT INTO carts (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) WHERE NOT ordered DO NOTHING
            ",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let (cart_id,): (CartId,) =
            sqlx::query_as("SELECT id FROM carts WHERE user_id = $1 AND NOT ordered")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;

        let (quantity,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO cart_lines (cart_id, photo_id, user_id, quantity)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (cart_id, photo_id)
            DO UPDATE SET quantity = cart_lines.quantity + 1
            RETURNING quantity
            ",
        )
        .bind(cart_id)
        .bind(photo_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(if quantity == 1 {
            AddOutcome::Added
        } else {
            AddOutcome::QuantityBumped
        })
    }

    /// Remove a photo's line from the cart entirely, regardless of quantity.
    ///
    /// Returns `false` if the photo is not a line of this cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_line(
        &self,
        cart_id: CartId,
        photo_id: PhotoId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1 AND photo_id = $2")
            .bind(cart_id)
            .bind(photo_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Decrement a line's quantity, removing the line when it reaches zero.
    ///
    /// Quantity never reaches 0 while attached: a quantity-1 line is
    /// deleted instead. Returns `None` if the photo is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn decrement_line(
        &self,
        cart_id: CartId,
        photo_id: PhotoId,
    ) -> Result<Option<DecrementOutcome>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(i32,)> = sqlx::query_as(
            r"
            SELECT quantity FROM cart_lines
            WHERE cart_id = $1 AND photo_id = $2
            FOR UPDATE
            ",
        )
        .bind(cart_id)
        .bind(photo_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((quantity,)) = row else {
            return Ok(None);
        };

        let outcome = if quantity > 1 {
            sqlx::query(
                r"
                UPDATE cart_lines SET quantity = quantity - 1
                WHERE cart_id = $1 AND photo_id = $2
                ",
            )
            .bind(cart_id)
            .bind(photo_id)
            .execute(&mut *tx)
            .await?;
            DecrementOutcome::Decremented
        } else {
            sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1 AND photo_id = $2")
                .bind(cart_id)
                .bind(photo_id)
                .execute(&mut *tx)
                .await?;
            DecrementOutcome::Removed
        };

        tx.commit().await?;

        Ok(Some(outcome))
    }

    /// Attach a coupon to the cart, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart doesn't exist.
    pub async fn attach_coupon(
        &self,
        cart_id: CartId,
        coupon_id: CouponId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE carts SET coupon_id = $1 WHERE id = $2")
            .bind(coupon_id)
            .bind(cart_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Attach an address to one of the cart's two address slots.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart doesn't exist.
    pub async fn set_address(
        &self,
        cart_id: CartId,
        kind: AddressKind,
        address_id: AddressId,
    ) -> Result<(), RepositoryError> {
        let query = match kind {
            AddressKind::Shipping => "UPDATE carts SET shipping_address_id = $1 WHERE id = $2",
            AddressKind::Billing => "UPDATE carts SET billing_address_id = $1 WHERE id = $2",
        };

        let result = sqlx::query(query)
            .bind(address_id)
            .bind(cart_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Finalize a successfully charged cart in a single transaction.
    ///
    /// Creates the payment record, flips every line's `ordered` flag, and
    /// marks the cart ordered with the payment link and reference code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart is missing or
    /// already ordered.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn finalize(
        &self,
        cart_id: CartId,
        user_id: UserId,
        charge_ref: &str,
        amount: Decimal,
        ref_code: &str,
    ) -> Result<Payment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(
            r"
            INSERT INTO payments (charge_ref, user_id, amount)
            VALUES ($1, $2, $3)
            RETURNING id, charge_ref, user_id, amount, created_at
            ",
        )
        .bind(charge_ref)
        .bind(user_id)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE cart_lines SET ordered = TRUE WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            r"
            UPDATE carts
            SET ordered = TRUE, payment_id = $1, ref_code = $2, ordered_at = NOW()
            WHERE id = $3 AND NOT ordered
            ",
        )
        .bind(payment.id)
        .bind(ref_code)
        .bind(cart_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        Ok(payment)
    }
}
