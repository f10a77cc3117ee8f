//! Coupon repository.

use rust_decimal::Decimal;
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::Coupon;

/// Repository for coupon lookups.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up a coupon by its code (case-sensitive exact match).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let coupon =
            sqlx::query_as::<_, Coupon>("SELECT id, code, amount FROM coupons WHERE code = $1")
                .bind(code)
                .fetch_optional(self.pool)
                .await?;

        Ok(coupon)
    }

    /// Create a coupon (used by the seed command).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, code: &str, amount: Decimal) -> Result<Coupon, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(
            r"
            INSERT INTO coupons (code, amount)
            VALUES ($1, $2)
            RETURNING id, code, amount
            ",
        )
        .bind(code)
        .bind(amount)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!("coupon code already exists: {code}"));
            }
            RepositoryError::Database(e)
        })?;

        Ok(coupon)
    }
}
