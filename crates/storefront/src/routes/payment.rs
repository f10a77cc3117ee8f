//! Payment route handlers.
//!
//! The payment page refuses to serve until checkout has resolved both
//! address slots, so a charge can never complete against an order with
//! nowhere to ship. The POST runs the charge sequence from
//! `services::payment` and finalizes the cart only after the processor
//! confirms the charge.

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum::Form;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use aperture_core::minor_units;

use crate::db::carts::CartRepository;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::flash::{self, FlashMessage};
use crate::middleware::RequireUser;
use crate::models::cart_total;
use crate::routes::checkout::checkbox;
use crate::services::ProcessorError;
use crate::services::checkout::PaymentOption;
use crate::services::payment::{
    PaymentError, PaymentForm, charge_source, ensure_customer, execute_charge, generate_ref_code,
    user_message,
};
use crate::state::AppState;

/// Payment page context.
#[derive(Debug, Serialize)]
pub struct PaymentContext {
    /// Cart total in major units; may show an over-discount below zero.
    pub total: Decimal,
    /// What the processor will actually be charged, in minor units.
    pub amount_minor: i64,
    pub currency: String,
    /// Publishable processor key for the browser SDK.
    pub public_key: String,
    /// Whether a saved card is available for one-click charge.
    pub card_on_file: bool,
    pub messages: Vec<FlashMessage>,
}

/// Payment form submission.
#[derive(Debug, Deserialize)]
pub struct PaymentSubmit {
    /// One-time payment method token from the browser SDK.
    #[serde(default)]
    pub token: String,
    /// Save the payment method for future purchases.
    #[serde(default, deserialize_with = "checkbox")]
    pub save: bool,
    /// Charge the saved card instead of a new token.
    #[serde(default, deserialize_with = "checkbox")]
    pub use_default: bool,
}

fn parse_option(option: &str) -> Result<PaymentOption> {
    PaymentOption::parse(option)
        .ok_or_else(|| AppError::NotFound(format!("unsupported payment option: {option}")))
}

/// Flash a processor failure and send the user back to the catalog.
///
/// Every kind maps to its user-facing message; responses outside the
/// processor's error protocol are additionally captured to Sentry.
async fn flash_processor_error(session: &Session, error: ProcessorError) -> Result<Redirect> {
    if let ProcessorError::Unexpected(ref detail) = error {
        let event_id = sentry::capture_message(
            &format!("unexpected processor response: {detail}"),
            sentry::Level::Error,
        );
        tracing::error!(%event_id, detail, "unexpected processor response");
    }

    flash::warning(session, user_message(&PaymentError::Processor(error))).await?;

    Ok(Redirect::to("/photos"))
}

/// Payment page. Hard-blocks until both address slots are set.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
    Path(option): Path<String>,
) -> Result<Response> {
    parse_option(&option)?;

    let carts = CartRepository::new(state.pool());
    let Some(cart) = carts.active_for(user.id).await? else {
        flash::warning(&session, "You do not have an active order").await?;
        return Ok(Redirect::to("/cart").into_response());
    };

    if !cart.addresses_complete() {
        flash::warning(&session, "You have not added a billing address").await?;
        return Ok(Redirect::to("/checkout").into_response());
    }

    let lines = carts.priced_lines(cart.id).await?;
    let coupon = carts.coupon_for(&cart).await?;
    let total = cart_total(&lines, coupon.map(|c| c.amount));

    let profile = UserRepository::new(state.pool()).get_profile(user.id).await?;
    let messages = flash::take(&session).await?;

    Ok(Json(PaymentContext {
        total,
        amount_minor: minor_units(total),
        currency: state.config().processor.currency.clone(),
        public_key: state.config().processor.public_key.clone(),
        card_on_file: profile.remembers_card && profile.customer_ref().is_some(),
        messages,
    })
    .into_response())
}

/// Charge the cart total and finalize the order.
///
/// On a processor failure the cart is left untouched and the user-facing
/// reason is flashed on the way back to the catalog; nothing is marked
/// ordered until the charge reference is in hand.
#[instrument(skip(state, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
    Path(option): Path<String>,
    Form(form): Form<PaymentSubmit>,
) -> Result<Redirect> {
    parse_option(&option)?;
    let back = format!("/payment/{option}");

    let carts = CartRepository::new(state.pool());
    let users = UserRepository::new(state.pool());

    let Some(cart) = carts.active_for(user.id).await? else {
        flash::warning(&session, "You do not have an active order").await?;
        return Ok(Redirect::to("/cart"));
    };

    if !cart.addresses_complete() {
        flash::warning(&session, "You have not added a billing address").await?;
        return Ok(Redirect::to("/checkout"));
    }

    // A fresh token is required unless an already-saved card is charged.
    if form.token.trim().is_empty() && !form.use_default {
        flash::warning(&session, "Invalid data received").await?;
        return Ok(Redirect::to(&back));
    }

    let profile = users.get_profile(user.id).await?;
    let mut stored_ref = profile.customer_ref().map(ToOwned::to_owned);

    // Tokenize the card into a reusable customer before charging, so a
    // saved card is saved even when the charge afterwards fails.
    if form.save && !form.token.trim().is_empty() {
        match ensure_customer(state.processor(), &profile, user.email.as_str(), &form.token).await
        {
            Ok(Some(new_ref)) => {
                users.remember_customer_ref(user.id, &new_ref).await?;
                stored_ref = Some(new_ref);
            }
            Ok(None) => {}
            Err(e) => return flash_processor_error(&session, e).await,
        }
    }

    let payment_form = PaymentForm {
        token: form.token.clone(),
        save: form.save,
        use_default: form.use_default,
    };

    let source = match charge_source(&payment_form, stored_ref.as_deref()) {
        Ok(source) => source,
        Err(e) => {
            flash::warning(&session, user_message(&e)).await?;
            return Ok(Redirect::to(&back));
        }
    };

    let lines = carts.priced_lines(cart.id).await?;
    let coupon = carts.coupon_for(&cart).await?;
    let total = cart_total(&lines, coupon.map(|c| c.amount));

    let receipt = match execute_charge(
        state.processor(),
        source,
        total,
        &state.config().processor.currency,
    )
    .await
    {
        Ok(receipt) => receipt,
        Err(e) => return flash_processor_error(&session, e).await,
    };

    let ref_code = generate_ref_code();
    carts
        .finalize(cart.id, user.id, &receipt.charge_ref, receipt.amount, &ref_code)
        .await?;

    tracing::info!(cart_id = %cart.id, ref_code, "order finalized");
    flash::success(&session, "Your order was successful!").await?;

    Ok(Redirect::to("/photos"))
}
