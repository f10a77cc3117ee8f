//! Database operations for the storefront `PostgreSQL`.
//!
//! # Tables
//!
//! - `users` / `profiles` - identity rows plus the 1:1 payment profile
//! - `tower_sessions.session` - tower-sessions storage
//! - `photos` - catalog listings
//! - `carts` / `cart_lines` - orders in progress and their line items
//! - `addresses` - shipping/billing address book
//! - `coupons` - flat-amount discount codes
//! - `payments` - immutable records of successful charges
//!
//! Repositories use runtime-checked queries (`sqlx::query_as`); the
//! uniqueness rules the workflows rely on (one active cart per user, one
//! line per (cart, photo), one default address per (user, kind)) live in
//! the migrations as unique indexes, so get-or-create is atomic at the
//! store rather than racy in application code.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p aperture-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod addresses;
pub mod carts;
pub mod coupons;
pub mod photos;
pub mod users;

pub use addresses::AddressRepository;
pub use carts::CartRepository;
pub use coupons::CouponRepository;
pub use photos::PhotoRepository;
pub use users::UserRepository;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
