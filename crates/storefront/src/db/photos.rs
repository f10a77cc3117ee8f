//! Photo catalog repository.

use rand::Rng;
use rand::distr::Alphanumeric;
use rust_decimal::Decimal;
use sqlx::PgPool;

use aperture_core::{UserId, slugify};

use super::RepositoryError;
use crate::models::Photo;

/// Fields for a new photo listing.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub description: String,
    pub image_path: String,
    pub crop_box: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    /// Explicit slug; derived from the description when absent.
    pub slug: Option<String>,
}

/// Editable fields of an existing listing.
#[derive(Debug, Clone)]
pub struct PhotoChanges {
    pub description: String,
    pub image_path: String,
    pub crop_box: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
}

const SELECT_COLUMNS: &str = r"
    SELECT id, user_id, description, image_path, crop_box,
           price, discount_price, slug, created_at
    FROM photos
";

/// Repository for photo catalog operations.
pub struct PhotoRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PhotoRepository<'a> {
    /// Create a new photo repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List photos, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Photo>, RepositoryError> {
        let photos = sqlx::query_as::<_, Photo>(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(photos)
    }

    /// Total number of listings, for pagination.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM photos")
            .fetch_one(self.pool)
            .await?;

        Ok(count.0)
    }

    /// Get a photo by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Photo>, RepositoryError> {
        let photo = sqlx::query_as::<_, Photo>(&format!("{SELECT_COLUMNS} WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        Ok(photo)
    }

    /// List all photos uploaded by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_username(&self, username: &str) -> Result<Vec<Photo>, RepositoryError> {
        let photos = sqlx::query_as::<_, Photo>(
            r"
            SELECT p.id, p.user_id, p.description, p.image_path, p.crop_box,
                   p.price, p.discount_price, p.slug, p.created_at
            FROM photos p
            JOIN users u ON u.id = p.user_id
            WHERE u.username = $1
            ORDER BY p.created_at DESC, p.id DESC
            ",
        )
        .bind(username)
        .fetch_all(self.pool)
        .await?;

        Ok(photos)
    }

    /// Create a new listing owned by `user_id`.
    ///
    /// The slug is derived from the description when not supplied; on a slug
    /// collision a short random suffix is appended and the insert retried
    /// once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken even after
    /// the retry.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, user_id: UserId, new: NewPhoto) -> Result<Photo, RepositoryError> {
        let base_slug = base_slug(&new);

        match self.insert(user_id, &new, &base_slug).await {
            Err(RepositoryError::Conflict(_)) => {
                let retry_slug = format!("{base_slug}-{}", random_suffix());
                self.insert(user_id, &new, &retry_slug).await
            }
            other => other,
        }
    }

    async fn insert(
        &self,
        user_id: UserId,
        new: &NewPhoto,
        slug: &str,
    ) -> Result<Photo, RepositoryError> {
        let photo = sqlx::query_as::<_, Photo>(
            r"
            INSERT INTO photos (user_id, description, image_path, crop_box,
                                price, discount_price, slug)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, description, image_path, crop_box,
                      price, discount_price, slug, created_at
            ",
        )
        .bind(user_id)
        .bind(&new.description)
        .bind(&new.image_path)
        .bind(&new.crop_box)
        .bind(new.price)
        .bind(new.discount_price)
        .bind(slug)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!("slug already exists: {slug}"));
            }
            RepositoryError::Database(e)
        })?;

        Ok(photo)
    }

    /// Update a listing, scoped to its owner.
    ///
    /// Returns `None` if no listing with that slug belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        slug: &str,
        user_id: UserId,
        changes: PhotoChanges,
    ) -> Result<Option<Photo>, RepositoryError> {
        let photo = sqlx::query_as::<_, Photo>(
            r"
            UPDATE photos
            SET description = $1, image_path = $2, crop_box = $3,
                price = $4, discount_price = $5
            WHERE slug = $6 AND user_id = $7
            RETURNING id, user_id, description, image_path, crop_box,
                      price, discount_price, slug, created_at
            ",
        )
        .bind(&changes.description)
        .bind(&changes.image_path)
        .bind(&changes.crop_box)
        .bind(changes.price)
        .bind(changes.discount_price)
        .bind(slug)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(photo)
    }

    /// Delete a listing, scoped to its owner.
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, slug: &str, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM photos WHERE slug = $1 AND user_id = $2")
            .bind(slug)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// The slug an insert is first attempted with: the explicit slug when one
/// was supplied, otherwise derived from the description, with a random
/// fallback for descriptions that slugify to nothing.
fn base_slug(new: &NewPhoto) -> String {
    match new.slug.as_deref() {
        Some(s) if !s.is_empty() => s.to_owned(),
        _ => {
            let derived = slugify(&new.description);
            if derived.is_empty() {
                random_suffix()
            } else {
                derived
            }
        }
    }
}

/// Short random slug suffix.
fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{NewPhoto, base_slug, random_suffix};

    fn photo(description: &str, slug: Option<&str>) -> NewPhoto {
        NewPhoto {
            description: description.to_owned(),
            image_path: "photos/test.jpg".to_owned(),
            crop_box: None,
            price: Decimal::new(1500, 2),
            discount_price: None,
            slug: slug.map(str::to_owned),
        }
    }

    #[test]
    fn test_explicit_slug_wins() {
        let new = photo("Golden hour at the pier", Some("pier"));
        assert_eq!(base_slug(&new), "pier");
        // The fields stay usable for the insert afterwards.
        assert_eq!(new.slug.as_deref(), Some("pier"));
    }

    #[test]
    fn test_empty_slug_derives_from_description() {
        let new = photo("Golden hour at the pier", Some(""));
        assert_eq!(base_slug(&new), "golden-hour-at-the-pier");
    }

    #[test]
    fn test_missing_slug_derives_from_description() {
        let new = photo("Fog over the headlands", None);
        assert_eq!(base_slug(&new), "fog-over-the-headlands");
    }

    #[test]
    fn test_unsluggable_description_falls_back_to_random() {
        let new = photo("!!!", None);
        let slug = base_slug(&new);
        assert_eq!(slug.len(), 6);
        assert!(slug.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_random_suffix_is_lowercase_alphanumeric() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_uppercase()));
    }
}
