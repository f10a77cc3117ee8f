//! Address book repository.

use sqlx::PgPool;

use aperture_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, AddressKind};

/// Fields for a new address entry.
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub street_address: String,
    pub apartment_address: String,
    pub country: String,
    pub zip: String,
    pub kind: AddressKind,
    pub make_default: bool,
}

const ADDRESS_COLUMNS: &str = r"
    SELECT id, user_id, street_address, apartment_address, country, zip,
           kind, is_default, created_at
    FROM addresses
";

/// Repository for address book operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's default address of the given kind, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn default_for(
        &self,
        user_id: UserId,
        kind: AddressKind,
    ) -> Result<Option<Address>, RepositoryError> {
        let address = sqlx::query_as::<_, Address>(&format!(
            "{ADDRESS_COLUMNS} WHERE user_id = $1 AND kind = $2 AND is_default"
        ))
        .bind(user_id)
        .bind(kind)
        .fetch_optional(self.pool)
        .await?;

        Ok(address)
    }

    /// Get an address by ID, scoped to its owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: AddressId,
        user_id: UserId,
    ) -> Result<Option<Address>, RepositoryError> {
        let address =
            sqlx::query_as::<_, Address>(&format!("{ADDRESS_COLUMNS} WHERE id = $1 AND user_id = $2"))
                .bind(id)
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;

        Ok(address)
    }

    /// Create a new address row for the user.
    ///
    /// When `make_default` is set, the previous default of the same kind is
    /// cleared in the same transaction, keeping at most one default per
    /// (user, kind).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn create(
        &self,
        user_id: UserId,
        new: NewAddress,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if new.make_default {
            sqlx::query(
                r"
                UPDATE addresses SET is_default = FALSE
                WHERE user_id = $1 AND kind = $2 AND is_default
                ",
            )
            .bind(user_id)
            .bind(new.kind)
            .execute(&mut *tx)
            .await?;
        }

        let address = sqlx::query_as::<_, Address>(
            r"
            INSERT INTO addresses (user_id, street_address, apartment_address,
                                   country, zip, kind, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, street_address, apartment_address, country,
                      zip, kind, is_default, created_at
            ",
        )
        .bind(user_id)
        .bind(&new.street_address)
        .bind(&new.apartment_address)
        .bind(&new.country)
        .bind(&new.zip)
        .bind(new.kind)
        .bind(new.make_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(address)
    }

    /// Duplicate an existing address as a new non-default billing row.
    ///
    /// The "billing same as shipping" checkout path always creates a fresh
    /// Billing-typed row; the shipping row itself is never reused.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the source address doesn't
    /// exist.
    pub async fn duplicate_as_billing(
        &self,
        source: AddressId,
    ) -> Result<Address, RepositoryError> {
        let address = sqlx::query_as::<_, Address>(
            r"
            INSERT INTO addresses (user_id, street_address, apartment_address,
                                   country, zip, kind, is_default)
            SELECT user_id, street_address, apartment_address, country, zip,
                   'billing', FALSE
            FROM addresses
            WHERE id = $1
            RETURNING id, user_id, street_address, apartment_address, country,
                      zip, kind, is_default, created_at
            ",
        )
        .bind(source)
        .fetch_optional(self.pool)
        .await?;

        address.ok_or(RepositoryError::NotFound)
    }
}
