//! Authentication route handlers.
//!
//! Sign-in is passwordless against the upstream identity provider: the
//! first login for an email creates the user (and their payment profile)
//! atomically, later logins reuse the row.

use axum::{
    Json,
    extract::State,
    response::Redirect,
};
use axum::Form;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use aperture_core::Email;

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::flash::{self, FlashMessage};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Login page context.
#[derive(Debug, Serialize)]
pub struct LoginContext {
    pub messages: Vec<FlashMessage>,
}

/// Login form submission.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
}

/// Login page.
#[instrument(skip(session))]
pub async fn login_page(session: Session) -> Result<Json<LoginContext>> {
    let messages = flash::take(&session).await?;
    Ok(Json(LoginContext { messages }))
}

/// Sign in, creating the account on first use.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let Ok(email) = Email::parse(&form.email) else {
        flash::warning(&session, "Enter a valid email address").await?;
        return Ok(Redirect::to("/auth/login"));
    };

    let username = form.username.trim();
    if username.is_empty() {
        flash::warning(&session, "Enter a username").await?;
        return Ok(Redirect::to("/auth/login"));
    }

    let user = match UserRepository::new(state.pool())
        .get_or_create(&email, username)
        .await
    {
        Ok(user) => user,
        Err(RepositoryError::Conflict(_)) => {
            flash::warning(&session, "That username or email is already taken").await?;
            return Ok(Redirect::to("/auth/login"));
        }
        Err(e) => return Err(AppError::Database(e)),
    };

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "user signed in");

    Ok(Redirect::to("/photos"))
}

/// Sign out.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    flash::info(&session, "You have been logged out.").await?;

    Ok(Redirect::to("/auth/login"))
}
