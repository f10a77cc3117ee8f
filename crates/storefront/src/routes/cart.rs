//! Cart route handlers.
//!
//! Every cart action resolves the photo by slug first, then works against
//! the user's single active cart. Outcomes are reported through one-shot
//! flash messages followed by a redirect, so a reload never repeats the
//! action.

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use aperture_core::UserId;

use crate::db::carts::{AddOutcome, CartRepository, DecrementOutcome};
use crate::db::photos::PhotoRepository;
use crate::error::{AppError, Result};
use crate::flash::{self, FlashMessage};
use crate::middleware::RequireUser;
use crate::models::{Cart, Coupon, Photo, PricedLine, cart_total};
use crate::state::AppState;

/// Cart summary context.
#[derive(Debug, Serialize)]
pub struct CartSummary {
    pub cart: Cart,
    pub lines: Vec<PricedLine>,
    pub coupon: Option<Coupon>,
    /// Sum of line totals at effective prices, minus the coupon.
    pub total: Decimal,
    pub messages: Vec<FlashMessage>,
}

/// Load the active cart with its lines, coupon, and total.
pub(crate) async fn load_summary(
    state: &AppState,
    user_id: UserId,
) -> Result<Option<CartSummary>> {
    let repo = CartRepository::new(state.pool());

    let Some(cart) = repo.active_for(user_id).await? else {
        return Ok(None);
    };

    let lines = repo.priced_lines(cart.id).await?;
    let coupon = repo.coupon_for(&cart).await?;
    let total = cart_total(&lines, coupon.as_ref().map(|c| c.amount));

    Ok(Some(CartSummary {
        cart,
        lines,
        coupon,
        total,
        messages: Vec::new(),
    }))
}

/// Resolve a photo by slug or 404.
async fn photo_by_slug(state: &AppState, slug: &str) -> Result<Photo> {
    PhotoRepository::new(state.pool())
        .get_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no photo with slug {slug}")))
}

/// Cart summary page.
#[instrument(skip(state, session))]
pub async fn summary(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
) -> Result<Response> {
    match load_summary(&state, user.id).await? {
        Some(mut summary) => {
            summary.messages = flash::take(&session).await?;
            Ok(Json(summary).into_response())
        }
        None => {
            flash::warning(&session, "You do not have an active order").await?;
            Ok(Redirect::to("/photos").into_response())
        }
    }
}

/// Add a photo to the cart, creating the cart and bumping quantity as
/// needed.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
    Path(slug): Path<String>,
) -> Result<Redirect> {
    let photo = photo_by_slug(&state, &slug).await?;

    let outcome = CartRepository::new(state.pool())
        .add_photo(user.id, photo.id)
        .await?;

    let message = match outcome {
        AddOutcome::Added => "This item was added to your cart.",
        AddOutcome::QuantityBumped => "This item quantity was updated.",
    };
    flash::info(&session, message).await?;

    Ok(Redirect::to("/cart"))
}

/// Remove a photo's line from the cart entirely.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
    Path(slug): Path<String>,
) -> Result<Redirect> {
    let photo = photo_by_slug(&state, &slug).await?;
    let repo = CartRepository::new(state.pool());

    let Some(cart) = repo.active_for(user.id).await? else {
        flash::warning(&session, "You do not have an active order").await?;
        return Ok(Redirect::to(&format!("/photos/{slug}")));
    };

    if repo.remove_line(cart.id, photo.id).await? {
        flash::info(&session, "This item was removed from your cart.").await?;
        Ok(Redirect::to("/cart"))
    } else {
        flash::warning(&session, "This item was not in your cart").await?;
        Ok(Redirect::to(&format!("/photos/{slug}")))
    }
}

/// Reduce a line's quantity by one, removing it at zero.
#[instrument(skip(state, session))]
pub async fn decrement(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
    Path(slug): Path<String>,
) -> Result<Redirect> {
    let photo = photo_by_slug(&state, &slug).await?;
    let repo = CartRepository::new(state.pool());

    let Some(cart) = repo.active_for(user.id).await? else {
        flash::warning(&session, "You do not have an active order").await?;
        return Ok(Redirect::to(&format!("/photos/{slug}")));
    };

    match repo.decrement_line(cart.id, photo.id).await? {
        Some(DecrementOutcome::Decremented) => {
            flash::info(&session, "This item quantity was updated.").await?;
            Ok(Redirect::to("/cart"))
        }
        Some(DecrementOutcome::Removed) => {
            flash::info(&session, "This item was removed from your cart.").await?;
            Ok(Redirect::to("/cart"))
        }
        None => {
            flash::warning(&session, "This item was not in your cart").await?;
            Ok(Redirect::to(&format!("/photos/{slug}")))
        }
    }
}
