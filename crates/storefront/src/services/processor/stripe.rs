//! Stripe API client.
//!
//! Thin form-encoded client for the three Stripe endpoints the payment
//! workflow uses: customer creation, payment method attachment, and
//! charges. Stripe's `error.type` field is classified into
//! [`ProcessorError`]; transport failures become `Connectivity`.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::ProcessorConfig;

use super::{ChargeRequest, ChargeSource, PaymentProcessor, ProcessorError};

/// Stripe API base URL.
const BASE_URL: &str = "https://api.stripe.com/v1";

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    base_url: String,
}

impl StripeClient {
    /// Create a new Stripe client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ProcessorError::InvalidRequest` if the secret key cannot be
    /// encoded into an Authorization header, or if the HTTP client fails to
    /// build.
    pub fn new(config: &ProcessorConfig) -> Result<Self, ProcessorError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| ProcessorError::InvalidRequest(format!("invalid secret key: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ProcessorError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_owned(),
        })
    }

    /// Override the API base URL (for tests against a local stub).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// POST a form to a Stripe endpoint and decode the success payload.
    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
        idempotency_key: Option<&str>,
    ) -> Result<T, ProcessorError> {
        let url = format!("{}{path}", self.base_url);

        let mut request = self.client.post(&url).form(form);
        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let response = request.send().await.map_err(classify_transport)?;
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ProcessorError::Unexpected(format!("malformed response: {e}")));
        }

        let body: StripeErrorEnvelope = response
            .json()
            .await
            .unwrap_or_else(|_| StripeErrorEnvelope::default());

        Err(classify_api_error(status.as_u16(), body.error))
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_customer(&self, email: &str) -> Result<String, ProcessorError> {
        let customer: CustomerResponse = self
            .post_form("/customers", &[("email", email)], None)
            .await?;

        Ok(customer.id)
    }

    async fn attach_payment_method(
        &self,
        customer_ref: &str,
        token: &str,
    ) -> Result<(), ProcessorError> {
        let _: SourceResponse = self
            .post_form(
                &format!("/customers/{customer_ref}/sources"),
                &[("source", token)],
                None,
            )
            .await?;

        Ok(())
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<String, ProcessorError> {
        let amount = request.amount_minor.to_string();
        let idempotency_key = request.idempotency_key.to_string();

        let mut form: Vec<(&str, &str)> = vec![
            ("amount", amount.as_str()),
            ("currency", request.currency.as_str()),
        ];
        match &request.source {
            ChargeSource::Customer(customer_ref) => form.push(("customer", customer_ref)),
            ChargeSource::Token(token) => form.push(("source", token)),
        }

        let charge: ChargeResponse = self
            .post_form("/charges", &form, Some(&idempotency_key))
            .await?;

        Ok(charge.id)
    }
}

/// Map a transport-level reqwest error to the taxonomy.
fn classify_transport(e: reqwest::Error) -> ProcessorError {
    ProcessorError::Connectivity(e.to_string())
}

/// Classify a Stripe error payload by its `type` field, falling back to the
/// HTTP status when the body is unusable.
fn classify_api_error(status: u16, error: StripeErrorBody) -> ProcessorError {
    match error.error_type.as_deref() {
        Some("card_error") => ProcessorError::Card {
            message: error
                .message
                .unwrap_or_else(|| "Your card was declined".to_owned()),
        },
        Some("rate_limit_error") => ProcessorError::RateLimited,
        Some("invalid_request_error") => {
            ProcessorError::InvalidRequest(error.message.unwrap_or_default())
        }
        Some("authentication_error") => ProcessorError::Authentication,
        Some(other) => ProcessorError::Processor(format!(
            "{other}: {}",
            error.message.unwrap_or_default()
        )),
        None => match status {
            401 => ProcessorError::Authentication,
            429 => ProcessorError::RateLimited,
            _ => ProcessorError::Unexpected(format!("HTTP {status}")),
        },
    }
}

/// Error envelope returned by the Stripe API.
#[derive(Debug, Default, Deserialize)]
struct StripeErrorEnvelope {
    #[serde(default)]
    error: StripeErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct StripeErrorBody {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SourceResponse {
    #[allow(dead_code)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct ChargeResponse {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(error_type: Option<&str>, message: Option<&str>) -> StripeErrorBody {
        StripeErrorBody {
            error_type: error_type.map(str::to_owned),
            message: message.map(str::to_owned),
        }
    }

    #[test]
    fn test_card_error_keeps_detail() {
        let err = classify_api_error(402, body(Some("card_error"), Some("Your card has expired.")));
        match err {
            ProcessorError::Card { message } => assert_eq!(message, "Your card has expired."),
            other => panic!("expected card error, got {other:?}"),
        }
    }

    #[test]
    fn test_card_error_without_message() {
        let err = classify_api_error(402, body(Some("card_error"), None));
        assert!(matches!(err, ProcessorError::Card { .. }));
    }

    #[test]
    fn test_rate_limit() {
        let err = classify_api_error(429, body(Some("rate_limit_error"), None));
        assert!(matches!(err, ProcessorError::RateLimited));
    }

    #[test]
    fn test_invalid_request() {
        let err = classify_api_error(400, body(Some("invalid_request_error"), Some("bad amount")));
        assert!(matches!(err, ProcessorError::InvalidRequest(m) if m == "bad amount"));
    }

    #[test]
    fn test_authentication() {
        let err = classify_api_error(401, body(Some("authentication_error"), None));
        assert!(matches!(err, ProcessorError::Authentication));
    }

    #[test]
    fn test_unknown_error_type_is_generic_processor_error() {
        // Stripe reported the error through its own envelope, so it stays
        // in the retryable bucket even when the type is one we don't map.
        let err = classify_api_error(500, body(Some("api_error"), Some("boom")));
        assert!(matches!(err, ProcessorError::Processor(m) if m.contains("api_error")));
    }

    #[test]
    fn test_unusable_body_falls_back_to_status() {
        assert!(matches!(
            classify_api_error(401, body(None, None)),
            ProcessorError::Authentication
        ));
        assert!(matches!(
            classify_api_error(429, body(None, None)),
            ProcessorError::RateLimited
        ));
        assert!(matches!(
            classify_api_error(500, body(None, None)),
            ProcessorError::Unexpected(_)
        ));
    }
}
