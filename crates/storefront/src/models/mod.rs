//! Domain models for the storefront.
//!
//! Rows load through `sqlx::FromRow` where the mapping is mechanical;
//! anything with a custom column encoding (address kinds) converts by hand.

pub mod address;
pub mod cart;
pub mod coupon;
pub mod payment;
pub mod photo;
pub mod user;

pub use address::{Address, AddressKind};
pub use cart::{Cart, CartLine, PricedLine, cart_total};
pub use coupon::Coupon;
pub use payment::Payment;
pub use photo::Photo;
pub use user::{CurrentUser, Profile, User};

/// Session storage keys.
pub mod session_keys {
    /// The authenticated user (`CurrentUser`).
    pub const CURRENT_USER: &str = "current_user";
    /// Pending flash messages (`Vec<Flash>`).
    pub const FLASH: &str = "flash";
}
