//! User and profile repository.
//!
//! User creation and profile creation are one transaction: every user has
//! exactly one profile from the moment the user row is visible.

use sqlx::PgPool;

use aperture_core::{Email, UserId};

use super::RepositoryError;
use crate::models::{Profile, User};

/// Repository for user and profile database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, username, email, created_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, username, email, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get an existing user by email, or create the user and their profile
    /// in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a concurrent request created
    /// the same email or username first.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn get_or_create(
        &self,
        email: &Email,
        username: &str,
    ) -> Result<User, RepositoryError> {
        if let Some(user) = self.get_by_email(email).await? {
            return Ok(user);
        }

        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (username, email)
            VALUES ($1, $2)
            RETURNING id, username, email, created_at
            ",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email or username already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        sqlx::query(
            r"
            INSERT INTO profiles (user_id)
            VALUES ($1)
            ",
        )
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Get the payment profile for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the profile row is
    /// missing: the user/profile factory guarantees it exists.
    pub async fn get_profile(&self, user_id: UserId) -> Result<Profile, RepositoryError> {
        let profile = sqlx::query_as::<_, Profile>(
            r"
            SELECT id, user_id, processor_customer_ref, remembers_card
            FROM profiles
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        profile.ok_or_else(|| {
            RepositoryError::DataCorruption(format!("user {user_id} has no profile"))
        })
    }

    /// Store the processor customer reference and flag the card as
    /// remembered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile doesn't exist.
    pub async fn remember_customer_ref(
        &self,
        user_id: UserId,
        customer_ref: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE profiles
            SET processor_customer_ref = $1, remembers_card = TRUE
            WHERE user_id = $2
            ",
        )
        .bind(customer_ref)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
