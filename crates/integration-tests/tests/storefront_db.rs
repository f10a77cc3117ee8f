//! Database-backed tests for the storefront repositories.
//!
//! These exercise the rules that live in SQL rather than in Rust: the
//! single-transaction user/profile factory, the `ON CONFLICT` add-to-cart
//! upserts, and order finalization. They require a running `PostgreSQL`
//! server; see the crate docs for how to run them.

use rust_decimal::Decimal;
use sqlx::PgPool;

use aperture_core::Email;
use aperture_storefront::db::RepositoryError;
use aperture_storefront::db::carts::{AddOutcome, CartRepository};
use aperture_storefront::db::photos::{NewPhoto, PhotoRepository};
use aperture_storefront::db::users::UserRepository;
use aperture_storefront::models::{Photo, User};

async fn seed_user(pool: &PgPool, email: &str, username: &str) -> User {
    let email = Email::parse(email).expect("valid email");
    UserRepository::new(pool)
        .get_or_create(&email, username)
        .await
        .expect("create user")
}

async fn seed_photo(pool: &PgPool, user: &User) -> Photo {
    PhotoRepository::new(pool)
        .create(
            user.id,
            NewPhoto {
                description: "Golden hour at the pier".to_owned(),
                image_path: "photos/pier.jpg".to_owned(),
                crop_box: None,
                price: Decimal::new(1500, 2),
                discount_price: None,
                slug: None,
            },
        )
        .await
        .expect("create photo")
}

// ============================================================================
// User/profile factory
// ============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires a PostgreSQL test database"]
async fn test_get_or_create_creates_user_and_profile_together(pool: PgPool) {
    let users = UserRepository::new(&pool);
    let email = Email::parse("ansel@example.com").expect("valid email");

    let user = users.get_or_create(&email, "ansel").await.expect("create");

    // The profile is visible as soon as the user is.
    let profile = users.get_profile(user.id).await.expect("profile");
    assert_eq!(profile.user_id, user.id);
    assert!(profile.customer_ref().is_none());
    assert!(!profile.remembers_card);

    // A repeat call returns the same row instead of inserting another.
    let again = users.get_or_create(&email, "ansel").await.expect("get");
    assert_eq!(again.id, user.id);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires a PostgreSQL test database"]
async fn test_get_or_create_rejects_taken_username(pool: PgPool) {
    seed_user(&pool, "ansel@example.com", "ansel").await;

    let other = Email::parse("imogen@example.com").expect("valid email");
    let err = UserRepository::new(&pool)
        .get_or_create(&other, "ansel")
        .await
        .expect_err("username is taken");

    assert!(matches!(err, RepositoryError::Conflict(_)));

    // The failed attempt must not leave an orphan profile behind.
    let (profiles,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(profiles, 1);
}

// ============================================================================
// Add-to-cart upserts
// ============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires a PostgreSQL test database"]
async fn test_add_photo_upserts_cart_and_line(pool: PgPool) {
    let user = seed_user(&pool, "ansel@example.com", "ansel").await;
    let photo = seed_photo(&pool, &user).await;
    let carts = CartRepository::new(&pool);

    let first = carts.add_photo(user.id, photo.id).await.expect("add");
    assert_eq!(first, AddOutcome::Added);

    let second = carts.add_photo(user.id, photo.id).await.expect("add again");
    assert_eq!(second, AddOutcome::QuantityBumped);

    // Still one cart, one line, quantity two.
    let cart = carts
        .active_for(user.id)
        .await
        .expect("query")
        .expect("active cart");
    let lines = carts.priced_lines(cart.id).await.expect("lines");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 2);

    let (cart_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM carts WHERE user_id = $1")
        .bind(user.id)
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(cart_count, 1);
}

// ============================================================================
// Finalization
// ============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires a PostgreSQL test database"]
async fn test_finalize_orders_cart_lines_and_payment_atomically(pool: PgPool) {
    let user = seed_user(&pool, "ansel@example.com", "ansel").await;
    let photo = seed_photo(&pool, &user).await;
    let carts = CartRepository::new(&pool);

    carts.add_photo(user.id, photo.id).await.expect("add");
    let cart = carts
        .active_for(user.id)
        .await
        .expect("query")
        .expect("active cart");

    let payment = carts
        .finalize(cart.id, user.id, "ch_test_1", Decimal::new(1500, 2), "REF1234567890ABCDEFG")
        .await
        .expect("finalize");
    assert_eq!(payment.user_id, user.id);
    assert_eq!(payment.charge_ref, "ch_test_1");

    // The cart is no longer active and carries the payment link.
    assert!(carts.active_for(user.id).await.expect("query").is_none());

    let (ordered, ref_code): (bool, Option<String>) =
        sqlx::query_as("SELECT ordered, ref_code FROM carts WHERE id = $1")
            .bind(cart.id)
            .fetch_one(&pool)
            .await
            .expect("cart row");
    assert!(ordered);
    assert_eq!(ref_code.as_deref(), Some("REF1234567890ABCDEFG"));

    let (all_lines_ordered,): (bool,) =
        sqlx::query_as("SELECT bool_and(ordered) FROM cart_lines WHERE cart_id = $1")
            .bind(cart.id)
            .fetch_one(&pool)
            .await
            .expect("line flags");
    assert!(all_lines_ordered);

    let (payments,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM payments")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(payments, 1);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires a PostgreSQL test database"]
async fn test_finalize_refuses_already_ordered_cart(pool: PgPool) {
    let user = seed_user(&pool, "ansel@example.com", "ansel").await;
    let photo = seed_photo(&pool, &user).await;
    let carts = CartRepository::new(&pool);

    carts.add_photo(user.id, photo.id).await.expect("add");
    let cart = carts
        .active_for(user.id)
        .await
        .expect("query")
        .expect("active cart");

    carts
        .finalize(cart.id, user.id, "ch_test_1", Decimal::new(1500, 2), "REF1234567890ABCDEFG")
        .await
        .expect("finalize");

    let err = carts
        .finalize(cart.id, user.id, "ch_test_2", Decimal::new(1500, 2), "REF1234567890ABCDEFH")
        .await
        .expect_err("cart already ordered");
    assert!(matches!(err, RepositoryError::NotFound));

    // The rejected attempt rolled back its payment row.
    let (payments,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM payments")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(payments, 1);
}
