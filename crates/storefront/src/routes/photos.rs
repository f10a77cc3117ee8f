//! Photo catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::photos::{NewPhoto, PhotoChanges, PhotoRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::Photo;
use crate::state::AppState;

/// Listings per page on the index.
const PAGE_SIZE: i64 = 10;

/// Index pagination query.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

/// Paginated index context.
#[derive(Debug, Serialize)]
pub struct PhotoIndex {
    pub photos: Vec<Photo>,
    pub page: i64,
    pub total_pages: i64,
}

/// Submitted listing fields, for both create and edit.
#[derive(Debug, Deserialize)]
pub struct PhotoForm {
    pub description: String,
    pub image_path: String,
    #[serde(default)]
    pub crop_box: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    /// Create only; ignored on edit (slugs are permanent).
    #[serde(default)]
    pub slug: Option<String>,
}

impl PhotoForm {
    /// Prices must be positive, and a discount must undercut the list
    /// price.
    fn validate(&self) -> Result<()> {
        if self.price <= Decimal::ZERO {
            return Err(AppError::BadRequest("Invalid data received".to_owned()));
        }
        if let Some(discount) = self.discount_price
            && (discount <= Decimal::ZERO || discount >= self.price)
        {
            return Err(AppError::BadRequest("Invalid data received".to_owned()));
        }
        Ok(())
    }
}

/// Number of index pages needed for `total` listings, never less than one.
const fn page_count(total: i64) -> i64 {
    if total <= 0 { 1 } else { (total - 1) / PAGE_SIZE + 1 }
}

/// Paginated photo listing, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PhotoIndex>> {
    let repo = PhotoRepository::new(state.pool());

    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * PAGE_SIZE;

    let photos = repo.list(PAGE_SIZE, offset).await?;
    let total = repo.count().await?;
    let total_pages = page_count(total);

    Ok(Json(PhotoIndex {
        photos,
        page,
        total_pages,
    }))
}

/// Listing detail by slug.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Photo>> {
    let photo = PhotoRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no photo with slug {slug}")))?;

    Ok(Json(photo))
}

/// All listings uploaded by one user, newest first.
#[instrument(skip(state))]
pub async fn by_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<Photo>>> {
    let photos = PhotoRepository::new(state.pool())
        .list_by_username(&username)
        .await?;

    Ok(Json(photos))
}

/// Create a listing owned by the signed-in user.
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(form): Json<PhotoForm>,
) -> Result<Response> {
    form.validate()?;

    let photo = PhotoRepository::new(state.pool())
        .create(
            user.id,
            NewPhoto {
                description: form.description,
                image_path: form.image_path,
                crop_box: form.crop_box,
                price: form.price,
                discount_price: form.discount_price,
                slug: form.slug,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(photo)).into_response())
}

/// Edit a listing; only its owner may.
#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(slug): Path<String>,
    Json(form): Json<PhotoForm>,
) -> Result<Json<Photo>> {
    form.validate()?;

    let photo = PhotoRepository::new(state.pool())
        .update(
            &slug,
            user.id,
            PhotoChanges {
                description: form.description,
                image_path: form.image_path,
                crop_box: form.crop_box,
                price: form.price,
                discount_price: form.discount_price,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no photo with slug {slug}")))?;

    Ok(Json(photo))
}

/// Delete a listing; only its owner may.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(slug): Path<String>,
) -> Result<StatusCode> {
    let deleted = PhotoRepository::new(state.pool()).delete(&slug, user.id).await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("no photo with slug {slug}")))
    }
}

#[cfg(test)]
mod tests {
    use super::page_count;

    #[test]
    fn test_page_count_rounds_up() {
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(1), 1);
        assert_eq!(page_count(10), 1);
        assert_eq!(page_count(11), 2);
        assert_eq!(page_count(25), 3);
    }
}
