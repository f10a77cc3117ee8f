//! Charge orchestration.
//!
//! The payment POST handler runs three steps through this module: optional
//! customer tokenization (`ensure_customer`), source selection
//! (`charge_source`), and the single charge attempt (`execute_charge`).
//! Each step takes the processor as `&dyn PaymentProcessor` so the whole
//! sequence unit-tests against a recording mock.

use rand::Rng;
use rand::distr::Alphanumeric;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use aperture_core::minor_units;

use crate::models::Profile;

use super::processor::{ChargeRequest, ChargeSource, PaymentProcessor, ProcessorError};

/// Length of the order reference code stamped at finalization.
const REF_CODE_LEN: usize = 20;

/// Validated payment form fields.
#[derive(Debug, Clone)]
pub struct PaymentForm {
    /// One-time payment method token from the processor's browser SDK.
    pub token: String,
    /// Store the payment method for future one-click purchases.
    pub save: bool,
    /// Charge the stored customer instead of the token.
    pub use_default: bool,
}

/// Errors from the charge sequence.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Charging a stored card was requested but the profile has no
    /// processor customer reference.
    #[error("no stored payment method on file")]
    MissingStoredCard,

    /// The processor reported an error.
    #[error(transparent)]
    Processor(#[from] ProcessorError),
}

/// A successful charge, ready for finalization.
#[derive(Debug, Clone)]
pub struct ChargeReceipt {
    /// The processor's charge reference.
    pub charge_ref: String,
    /// The cart total recorded on the payment row (major units).
    pub amount: Decimal,
}

/// Ensure the processor knows a reusable customer when the user asked to
/// save their card.
///
/// Reuses the profile's existing customer reference (attaching the new
/// payment method to it), or creates a new customer for the user's email
/// and attaches the method. Returns the newly created customer reference
/// when one was created; the caller persists it on the profile.
///
/// # Errors
///
/// Returns any processor error unchanged.
pub async fn ensure_customer(
    processor: &dyn PaymentProcessor,
    profile: &Profile,
    email: &str,
    token: &str,
) -> Result<Option<String>, ProcessorError> {
    match profile.customer_ref() {
        Some(customer_ref) => {
            processor.attach_payment_method(customer_ref, token).await?;
            Ok(None)
        }
        None => {
            let customer_ref = processor.create_customer(email).await?;
            processor.attach_payment_method(&customer_ref, token).await?;
            Ok(Some(customer_ref))
        }
    }
}

/// Pick what the charge is drawn against.
///
/// A stored customer when `use_default` or `save` was requested (a token
/// can only be charged once, so a saved card must charge the customer),
/// otherwise the one-time token.
///
/// # Errors
///
/// Returns `PaymentError::MissingStoredCard` when a stored charge is
/// requested but no customer reference exists. `stored_ref` should reflect
/// any customer created earlier in this request.
pub fn charge_source(
    form: &PaymentForm,
    stored_ref: Option<&str>,
) -> Result<ChargeSource, PaymentError> {
    if form.use_default || form.save {
        let customer_ref = stored_ref.ok_or(PaymentError::MissingStoredCard)?;
        Ok(ChargeSource::Customer(customer_ref.to_owned()))
    } else {
        Ok(ChargeSource::Token(form.token.clone()))
    }
}

/// Issue the single charge attempt for a cart total.
///
/// The charged amount is the total converted to minor units, clamped at
/// zero (an over-discounting coupon never produces a negative charge). The
/// receipt records the unclamped total, which is what lands on the payment
/// row. A fresh idempotency key accompanies the attempt so a client retry
/// after a dropped connection cannot double-charge.
///
/// # Errors
///
/// Returns any processor error unchanged; the caller maps it to a user
/// message and leaves the cart untouched.
pub async fn execute_charge(
    processor: &dyn PaymentProcessor,
    source: ChargeSource,
    total: Decimal,
    currency: &str,
) -> Result<ChargeReceipt, ProcessorError> {
    let request = ChargeRequest {
        amount_minor: minor_units(total),
        currency: currency.to_owned(),
        source,
        idempotency_key: Uuid::new_v4(),
    };

    let charge_ref = processor.charge(&request).await?;

    Ok(ChargeReceipt {
        charge_ref,
        amount: total,
    })
}

/// The user-facing warning for a failed charge.
///
/// Card declines surface the processor-supplied detail verbatim; all other
/// kinds get generic text.
#[must_use]
pub fn user_message(error: &PaymentError) -> String {
    match error {
        PaymentError::MissingStoredCard => {
            "You have no saved card to charge. Please enter your card details.".to_owned()
        }
        PaymentError::Processor(ProcessorError::Card { message }) => message.clone(),
        PaymentError::Processor(ProcessorError::RateLimited) => "Rate limit error".to_owned(),
        PaymentError::Processor(ProcessorError::InvalidRequest(_)) => {
            "Invalid parameters".to_owned()
        }
        PaymentError::Processor(ProcessorError::Authentication) => "Not authenticated".to_owned(),
        PaymentError::Processor(ProcessorError::Connectivity(_)) => "Network error".to_owned(),
        PaymentError::Processor(ProcessorError::Processor(_)) => {
            "Something went wrong. You were not charged. Please try again.".to_owned()
        }
        PaymentError::Processor(ProcessorError::Unexpected(_)) => {
            "A serious error occurred. We have been notified.".to_owned()
        }
    }
}

/// Generate the order reference code stamped on a finalized cart.
#[must_use]
pub fn generate_ref_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(REF_CODE_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use aperture_core::{ProfileId, UserId};

    use super::*;

    /// Recording mock processor.
    #[derive(Default)]
    struct MockProcessor {
        calls: Mutex<Vec<String>>,
        charges: Mutex<Vec<ChargeRequest>>,
        fail_charge: Option<fn() -> ProcessorError>,
    }

    impl MockProcessor {
        fn failing(error: fn() -> ProcessorError) -> Self {
            Self {
                fail_charge: Some(error),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl PaymentProcessor for MockProcessor {
        async fn create_customer(&self, email: &str) -> Result<String, ProcessorError> {
            self.calls
                .lock()
                .expect("lock")
                .push(format!("create_customer:{email}"));
            Ok("cus_new".to_owned())
        }

        async fn attach_payment_method(
            &self,
            customer_ref: &str,
            token: &str,
        ) -> Result<(), ProcessorError> {
            self.calls
                .lock()
                .expect("lock")
                .push(format!("attach:{customer_ref}:{token}"));
            Ok(())
        }

        async fn charge(&self, request: &ChargeRequest) -> Result<String, ProcessorError> {
            if let Some(fail) = self.fail_charge {
                return Err(fail());
            }
            self.charges.lock().expect("lock").push(request.clone());
            Ok("ch_1".to_owned())
        }
    }

    fn profile(customer_ref: Option<&str>) -> Profile {
        Profile {
            id: ProfileId::new(1),
            user_id: UserId::new(1),
            processor_customer_ref: customer_ref.map(str::to_owned),
            remembers_card: customer_ref.is_some(),
        }
    }

    fn form(save: bool, use_default: bool) -> PaymentForm {
        PaymentForm {
            token: "tok_visa".to_owned(),
            save,
            use_default,
        }
    }

    #[tokio::test]
    async fn test_ensure_customer_reuses_existing_ref() {
        let processor = MockProcessor::default();
        let created = ensure_customer(&processor, &profile(Some("cus_77")), "a@b.c", "tok_visa")
            .await
            .expect("ensure");

        assert_eq!(created, None);
        assert_eq!(processor.calls(), vec!["attach:cus_77:tok_visa"]);
    }

    #[tokio::test]
    async fn test_ensure_customer_creates_when_absent() {
        let processor = MockProcessor::default();
        let created = ensure_customer(&processor, &profile(None), "a@b.c", "tok_visa")
            .await
            .expect("ensure");

        assert_eq!(created.as_deref(), Some("cus_new"));
        assert_eq!(
            processor.calls(),
            vec!["create_customer:a@b.c", "attach:cus_new:tok_visa"]
        );
    }

    #[test]
    fn test_charge_source_token_when_no_flags() {
        let source = charge_source(&form(false, false), None).expect("source");
        assert!(matches!(source, ChargeSource::Token(t) if t == "tok_visa"));
    }

    #[test]
    fn test_charge_source_customer_when_use_default() {
        let source = charge_source(&form(false, true), Some("cus_77")).expect("source");
        assert!(matches!(source, ChargeSource::Customer(c) if c == "cus_77"));
    }

    #[test]
    fn test_charge_source_missing_stored_card() {
        let err = charge_source(&form(false, true), None).expect_err("should fail");
        assert!(matches!(err, PaymentError::MissingStoredCard));
    }

    #[tokio::test]
    async fn test_execute_charge_converts_to_minor_units() {
        let processor = MockProcessor::default();
        let receipt = execute_charge(
            &processor,
            ChargeSource::Token("tok_visa".to_owned()),
            Decimal::new(30, 0),
            "usd",
        )
        .await
        .expect("charge");

        assert_eq!(receipt.charge_ref, "ch_1");
        assert_eq!(receipt.amount, Decimal::new(30, 0));

        let charges = processor.charges.lock().expect("lock");
        assert_eq!(charges.len(), 1);
        assert_eq!(charges[0].amount_minor, 3000);
        assert_eq!(charges[0].currency, "usd");
        assert!(!charges[0].idempotency_key.is_nil());
    }

    #[tokio::test]
    async fn test_execute_charge_clamps_negative_total() {
        // Coupon larger than the cart total: record the raw total but
        // charge zero.
        let processor = MockProcessor::default();
        let receipt = execute_charge(
            &processor,
            ChargeSource::Token("tok_visa".to_owned()),
            Decimal::new(-15, 0),
            "usd",
        )
        .await
        .expect("charge");

        assert_eq!(receipt.amount, Decimal::new(-15, 0));
        let charges = processor.charges.lock().expect("lock");
        assert_eq!(charges[0].amount_minor, 0);
    }

    #[tokio::test]
    async fn test_card_error_surfaces_processor_detail() {
        let processor = MockProcessor::failing(|| ProcessorError::Card {
            message: "Your card has insufficient funds.".to_owned(),
        });
        let err = execute_charge(
            &processor,
            ChargeSource::Token("tok_visa".to_owned()),
            Decimal::new(30, 0),
            "usd",
        )
        .await
        .expect_err("should fail");

        let message = user_message(&PaymentError::Processor(err));
        assert!(message.contains("insufficient funds"));
    }

    #[test]
    fn test_user_messages_distinct_per_kind() {
        let cases: Vec<(PaymentError, &str)> = vec![
            (ProcessorError::RateLimited.into(), "Rate limit error"),
            (
                ProcessorError::InvalidRequest("x".to_owned()).into(),
                "Invalid parameters",
            ),
            (ProcessorError::Authentication.into(), "Not authenticated"),
            (
                ProcessorError::Connectivity("timeout".to_owned()).into(),
                "Network error",
            ),
            (
                ProcessorError::Processor("boom".to_owned()).into(),
                "Something went wrong. You were not charged. Please try again.",
            ),
            (
                ProcessorError::Unexpected("HTTP 500".to_owned()).into(),
                "A serious error occurred. We have been notified.",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(user_message(&error), expected);
        }
    }

    #[test]
    fn test_generic_processor_error_keeps_retry_message() {
        // An error Stripe reported itself (e.g. `api_error`) is retryable
        // and must not read like an internal failure.
        let generic =
            PaymentError::Processor(ProcessorError::Processor("api_error: boom".to_owned()));
        assert_eq!(
            user_message(&generic),
            "Something went wrong. You were not charged. Please try again."
        );

        let unexpected =
            PaymentError::Processor(ProcessorError::Unexpected("malformed response".to_owned()));
        assert_eq!(
            user_message(&unexpected),
            "A serious error occurred. We have been notified."
        );
    }

    #[test]
    fn test_ref_code_shape() {
        let code = generate_ref_code();
        assert_eq!(code.len(), REF_CODE_LEN);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(code, generate_ref_code());
    }
}
