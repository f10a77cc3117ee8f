//! Payment processor interface.
//!
//! The card processor is an external HTTPS service. Everything the payment
//! workflow needs from it sits behind [`PaymentProcessor`], so the workflow
//! is testable with a recording mock and the production implementation
//! ([`stripe::StripeClient`]) stays a thin HTTP client.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod stripe;

pub use stripe::StripeClient;

/// Errors reported by the card processor, classified for user messaging.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// The card was declined; `message` is the processor-supplied detail
    /// and is surfaced to the user verbatim.
    #[error("card error: {message}")]
    Card { message: String },

    /// Too many requests made to the processor API too quickly.
    #[error("rate limited by the processor")]
    RateLimited,

    /// Invalid parameters were supplied to the processor API.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication with the processor API failed.
    #[error("processor authentication failed")]
    Authentication,

    /// Network communication with the processor failed.
    #[error("processor connection error: {0}")]
    Connectivity(String),

    /// Any other error the processor itself reported through its error
    /// protocol. The charge did not go through; the user may retry.
    #[error("processor error: {0}")]
    Processor(String),

    /// A response outside the processor's own error protocol: a malformed
    /// body or a status with no usable error envelope. These are the
    /// failures worth alerting on.
    #[error("unexpected processor response: {0}")]
    Unexpected(String),
}

/// What a charge is drawn against.
#[derive(Debug, Clone)]
pub enum ChargeSource {
    /// A stored customer's default payment method.
    Customer(String),
    /// A one-time payment method token. A token can only be charged once.
    Token(String),
}

/// A single charge attempt.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    /// Amount in integer minor units (cents).
    pub amount_minor: i64,
    /// ISO 4217 currency code, lowercase.
    pub currency: String,
    pub source: ChargeSource,
    /// Fresh per-attempt key so a client-side retry after a network failure
    /// cannot double-charge.
    pub idempotency_key: Uuid,
}

/// Operations the checkout/payment workflows need from the card processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a reusable billing profile for an email address.
    ///
    /// Returns the opaque customer reference.
    async fn create_customer(&self, email: &str) -> Result<String, ProcessorError>;

    /// Attach a payment method token to an existing customer.
    async fn attach_payment_method(
        &self,
        customer_ref: &str,
        token: &str,
    ) -> Result<(), ProcessorError>;

    /// Issue a charge. Exactly one attempt; no retry.
    ///
    /// Returns the processor's charge reference.
    async fn charge(&self, request: &ChargeRequest) -> Result<String, ProcessorError>;
}
