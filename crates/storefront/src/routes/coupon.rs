//! Coupon route handler.

use axum::{Form, extract::State, response::Redirect};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::carts::CartRepository;
use crate::db::coupons::CouponRepository;
use crate::error::Result;
use crate::flash;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Coupon form submission.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub code: String,
}

/// Apply a coupon code to the active cart, replacing any previous coupon.
#[instrument(skip(state, session, form))]
pub async fn apply(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
    Form(form): Form<CouponForm>,
) -> Result<Redirect> {
    let code = form.code.trim();
    if code.is_empty() {
        flash::warning(&session, "Invalid data received").await?;
        return Ok(Redirect::to("/checkout"));
    }

    let Some(coupon) = CouponRepository::new(state.pool()).find_by_code(code).await? else {
        flash::warning(&session, "This coupon does not exist").await?;
        return Ok(Redirect::to("/checkout"));
    };

    let carts = CartRepository::new(state.pool());
    let Some(cart) = carts.active_for(user.id).await? else {
        flash::warning(&session, "You do not have an active order").await?;
        return Ok(Redirect::to("/cart"));
    };

    carts.attach_coupon(cart.id, coupon.id).await?;
    flash::success(&session, "Successfully added coupon").await?;

    Ok(Redirect::to("/checkout"))
}
