//! Seed the database with catalog data from a YAML file.
//!
//! The file declares users, each with their photo listings, plus coupon
//! codes:
//!
//! ```yaml
//! users:
//!   - username: demo
//!     email: demo@example.com
//!     photos:
//!       - description: Golden hour at the pier
//!         image_path: photos/pier-golden-hour.jpg
//!         price: "15.00"
//!         discount_price: "12.00"
//! coupons:
//!   - code: WELCOME10
//!     amount: "10.00"
//! ```
//!
//! Seeding is additive and idempotent-ish: existing users are reused,
//! coupon code collisions are skipped with a warning.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use aperture_core::Email;
use aperture_storefront::db::photos::NewPhoto;
use aperture_storefront::db::{
    CouponRepository, PhotoRepository, RepositoryError, UserRepository, create_pool,
};
use secrecy::SecretString;

/// Top-level seed file structure.
#[derive(Debug, Deserialize)]
struct SeedConfig {
    #[serde(default)]
    users: Vec<SeedUser>,
    #[serde(default)]
    coupons: Vec<SeedCoupon>,
}

#[derive(Debug, Deserialize)]
struct SeedUser {
    username: String,
    email: String,
    #[serde(default)]
    photos: Vec<SeedPhoto>,
}

#[derive(Debug, Deserialize)]
struct SeedPhoto {
    description: String,
    image_path: String,
    #[serde(default)]
    crop_box: Option<String>,
    price: Decimal,
    #[serde(default)]
    discount_price: Option<Decimal>,
    #[serde(default)]
    slug: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeedCoupon {
    code: String,
    amount: Decimal,
}

/// Seed users, photos, and coupons from a YAML file.
///
/// # Errors
///
/// Returns an error if environment variables are missing, the file cannot
/// be read or parsed, or a database operation fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "STOREFRONT_DATABASE_URL not set")?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed data from file");
    let content = tokio::fs::read_to_string(path).await?;
    let config: SeedConfig = serde_yaml::from_str(&content)?;

    info!(
        users = config.users.len(),
        coupons = config.coupons.len(),
        "Parsed seed file"
    );

    let pool = create_pool(&database_url).await?;
    info!("Connected to database");

    let users = UserRepository::new(&pool);
    let photos = PhotoRepository::new(&pool);
    let coupons = CouponRepository::new(&pool);

    let mut photo_count = 0usize;
    for seed_user in &config.users {
        let email = Email::parse(&seed_user.email)
            .map_err(|e| format!("invalid email {}: {e}", seed_user.email))?;
        let user = users.get_or_create(&email, &seed_user.username).await?;

        for photo in &seed_user.photos {
            photos
                .create(
                    user.id,
                    NewPhoto {
                        description: photo.description.clone(),
                        image_path: photo.image_path.clone(),
                        crop_box: photo.crop_box.clone(),
                        price: photo.price,
                        discount_price: photo.discount_price,
                        slug: photo.slug.clone(),
                    },
                )
                .await?;
            photo_count += 1;
        }
    }

    let mut coupon_count = 0usize;
    for coupon in &config.coupons {
        match coupons.create(&coupon.code, coupon.amount).await {
            Ok(_) => coupon_count += 1,
            Err(RepositoryError::Conflict(_)) => {
                warn!(code = %coupon.code, "Coupon already exists, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(photos = photo_count, coupons = coupon_count, "Seeding complete");
    Ok(())
}
