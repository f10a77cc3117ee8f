//! Checkout route handlers.
//!
//! The checkout POST resolves the two address slots in a fixed order,
//! shipping then billing, and finishes by routing to the selected payment
//! option. Slot resolution itself is planned in `services::checkout`; this
//! handler applies the plan through the repositories.

use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Deserializer, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use aperture_core::AddressId;

use crate::db::addresses::AddressRepository;
use crate::db::carts::CartRepository;
use crate::error::Result;
use crate::flash::{self, FlashMessage};
use crate::middleware::RequireUser;
use crate::models::{Address, AddressKind};
use crate::routes::cart::CartSummary;
use crate::services::checkout::{
    AddressChoice, NewAddressFields, PaymentOption, SlotOutcome, resolve_slot,
};
use crate::state::AppState;

/// Checkout page context.
#[derive(Debug, Serialize)]
pub struct CheckoutContext {
    pub summary: CartSummary,
    pub default_shipping: Option<Address>,
    pub default_billing: Option<Address>,
    pub messages: Vec<FlashMessage>,
}

/// Checkout form submission.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub shipping_address2: String,
    #[serde(default)]
    pub shipping_country: String,
    #[serde(default)]
    pub shipping_zip: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub use_default_shipping: bool,
    #[serde(default, deserialize_with = "checkbox")]
    pub set_default_shipping: bool,

    #[serde(default)]
    pub billing_address: String,
    #[serde(default)]
    pub billing_address2: String,
    #[serde(default)]
    pub billing_country: String,
    #[serde(default)]
    pub billing_zip: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub use_default_billing: bool,
    #[serde(default, deserialize_with = "checkbox")]
    pub set_default_billing: bool,

    /// Copy the just-resolved shipping address into the billing slot.
    #[serde(default, deserialize_with = "checkbox")]
    pub same_billing_address: bool,

    #[serde(default)]
    pub payment_option: String,
}

impl CheckoutForm {
    fn shipping_choice(&self) -> AddressChoice {
        if self.use_default_shipping {
            AddressChoice::UseDefault
        } else {
            AddressChoice::New(NewAddressFields {
                street_address: self.shipping_address.clone(),
                apartment_address: self.shipping_address2.clone(),
                country: self.shipping_country.clone(),
                zip: self.shipping_zip.clone(),
                set_default: self.set_default_shipping,
            })
        }
    }

    fn billing_choice(&self) -> AddressChoice {
        if self.use_default_billing {
            AddressChoice::UseDefault
        } else {
            AddressChoice::New(NewAddressFields {
                street_address: self.billing_address.clone(),
                apartment_address: self.billing_address2.clone(),
                country: self.billing_country.clone(),
                zip: self.billing_zip.clone(),
                set_default: self.set_default_billing,
            })
        }
    }
}

/// Deserialize an HTML checkbox: absent means unchecked.
pub(crate) fn checkbox<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(matches!(value.as_str(), "on" | "true" | "1"))
}

/// Checkout page: cart summary plus the user's default addresses.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
) -> Result<Response> {
    let Some(summary) = super::cart::load_summary(&state, user.id).await? else {
        flash::warning(&session, "You do not have an active order").await?;
        return Ok(Redirect::to("/photos").into_response());
    };

    let addresses = AddressRepository::new(state.pool());
    let default_shipping = addresses.default_for(user.id, AddressKind::Shipping).await?;
    let default_billing = addresses.default_for(user.id, AddressKind::Billing).await?;
    let messages = flash::take(&session).await?;

    Ok(Json(CheckoutContext {
        summary,
        default_shipping,
        default_billing,
        messages,
    })
    .into_response())
}

/// Apply a checkout submission to the active cart.
///
/// Shipping resolves first. A missing default aborts the submission; an
/// incomplete new entry leaves that slot unset but lets the other slot
/// proceed. When `same_billing_address` is set, the resolved shipping row
/// is copied into a fresh billing row rather than shared.
#[instrument(skip(state, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Redirect> {
    let carts = CartRepository::new(state.pool());
    let addresses = AddressRepository::new(state.pool());

    let Some(cart) = carts.active_for(user.id).await? else {
        flash::warning(&session, "You do not have an active order").await?;
        return Ok(Redirect::to("/cart"));
    };

    // Shipping slot.
    let shipping_default = addresses
        .default_for(user.id, AddressKind::Shipping)
        .await?
        .map(|a| a.id);

    let shipping_id: Option<AddressId> = match resolve_slot(
        AddressKind::Shipping,
        &form.shipping_choice(),
        shipping_default,
    ) {
        SlotOutcome::Attach(id) => Some(id),
        SlotOutcome::Create(new) => Some(addresses.create(user.id, new).await?.id),
        SlotOutcome::MissingDefault => {
            flash::warning(&session, "No default shipping address available").await?;
            return Ok(Redirect::to("/checkout"));
        }
        SlotOutcome::Incomplete => {
            flash::warning(&session, "Please fill in the required shipping address fields")
                .await?;
            None
        }
    };

    if let Some(id) = shipping_id {
        carts.set_address(cart.id, AddressKind::Shipping, id).await?;
    }

    // Billing slot. "Same as shipping" always copies into a fresh
    // billing-typed row.
    if form.same_billing_address {
        if let Some(shipping_id) = shipping_id {
            let billing = addresses.duplicate_as_billing(shipping_id).await?;
            carts
                .set_address(cart.id, AddressKind::Billing, billing.id)
                .await?;
        } else {
            flash::warning(&session, "Please fill in the required billing address fields")
                .await?;
        }
    } else {
        let billing_default = addresses
            .default_for(user.id, AddressKind::Billing)
            .await?
            .map(|a| a.id);

        match resolve_slot(AddressKind::Billing, &form.billing_choice(), billing_default) {
            SlotOutcome::Attach(id) => {
                carts.set_address(cart.id, AddressKind::Billing, id).await?;
            }
            SlotOutcome::Create(new) => {
                let billing = addresses.create(user.id, new).await?;
                carts
                    .set_address(cart.id, AddressKind::Billing, billing.id)
                    .await?;
            }
            SlotOutcome::MissingDefault => {
                flash::warning(&session, "No default billing address available").await?;
                return Ok(Redirect::to("/checkout"));
            }
            SlotOutcome::Incomplete => {
                flash::warning(&session, "Please fill in the required billing address fields")
                    .await?;
            }
        }
    }

    match PaymentOption::parse(&form.payment_option) {
        Some(option) => Ok(Redirect::to(&format!("/payment/{}", option.as_str()))),
        None => {
            flash::warning(&session, "Invalid payment option selected").await?;
            Ok(Redirect::to("/checkout"))
        }
    }
}
