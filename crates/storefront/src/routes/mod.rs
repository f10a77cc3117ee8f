//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (pings the database)
//!
//! # Catalog
//! GET    /photos                  - Paginated listing, newest first
//! POST   /photos                  - Create a listing (requires auth)
//! GET    /photos/{slug}           - Listing detail
//! PUT    /photos/{slug}           - Edit a listing (owner only)
//! DELETE /photos/{slug}           - Delete a listing (owner only)
//! GET    /users/{username}/photos - All listings by one user
//!
//! # Cart
//! GET  /cart                      - Cart summary with totals
//! POST /cart/add/{slug}           - Add a photo (or bump its quantity)
//! POST /cart/remove/{slug}        - Remove a line entirely
//! POST /cart/decrement/{slug}     - Reduce a line's quantity by one
//!
//! # Checkout and payment
//! GET  /checkout                  - Checkout context (cart + defaults)
//! POST /checkout                  - Resolve address slots, pick payment
//! POST /coupon                    - Apply a coupon code to the cart
//! GET  /payment/{option}          - Payment page (blocks until addresses set)
//! POST /payment/{option}          - Charge and finalize the order
//!
//! # Auth
//! GET  /auth/login                - Login context
//! POST /auth/login                - Sign in (creates the account on first use)
//! POST /auth/logout               - Sign out
//! ```
//!
//! Page GETs return JSON context objects (the presentation layer lives in a
//! separate frontend); POST actions redirect and queue flash messages.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod coupon;
pub mod payment;
pub mod photos;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the catalog routes router.
pub fn photo_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(photos::index).post(photos::create))
        .route(
            "/{slug}",
            get(photos::show)
                .put(photos::update)
                .delete(photos::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::summary))
        .route("/add/{slug}", post(cart::add))
        .route("/remove/{slug}", post(cart::remove))
        .route("/decrement/{slug}", post(cart::decrement))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/photos", photo_routes())
        .route("/users/{username}/photos", get(photos::by_user))
        .nest("/cart", cart_routes())
        .route(
            "/checkout",
            get(checkout::show).post(checkout::submit),
        )
        .route("/coupon", post(coupon::apply))
        .route(
            "/payment/{option}",
            get(payment::show).post(payment::submit),
        )
        .nest("/auth", auth_routes())
}
