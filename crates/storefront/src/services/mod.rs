//! Business logic services for the storefront.
//!
//! # Services
//!
//! - [`checkout`] - address slot resolution for checkout submissions
//! - [`payment`] - charge orchestration against the card processor
//! - [`processor`] - the card processor interface and Stripe client
//!
//! The workflow logic is kept pure where possible (planning functions over
//! already-loaded rows) so it unit-tests without a database; the route
//! handlers apply the resulting plans through the repositories.

pub mod checkout;
pub mod payment;
pub mod processor;

pub use processor::{PaymentProcessor, ProcessorError, StripeClient};
