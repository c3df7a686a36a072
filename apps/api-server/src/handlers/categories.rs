//! Category handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use pressroom_shared::dto::{CategoryRequest, CategoryResponse};

use super::views;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/categories
pub async fn create_category(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CategoryRequest>,
) -> AppResult<HttpResponse> {
    let category = state
        .categories
        .create(&identity.actor(), body.into_inner().name)
        .await?;
    Ok(HttpResponse::Created().json(views::category(category)))
}

/// GET /api/categories
pub async fn list_categories(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let categories: Vec<CategoryResponse> = state
        .categories
        .list()
        .await?
        .into_iter()
        .map(views::category)
        .collect();
    Ok(HttpResponse::Ok().json(categories))
}

/// GET /api/categories/{id}
pub async fn get_category(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let category = state
        .categories
        .get(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(views::category(category)))
}

/// PUT /api/categories/{id}
pub async fn update_category(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CategoryRequest>,
) -> AppResult<HttpResponse> {
    let category = state
        .categories
        .rename(&identity.actor(), path.into_inner(), body.into_inner().name)
        .await?;
    Ok(HttpResponse::Ok().json(views::category(category)))
}

/// DELETE /api/categories/{id}
pub async fn delete_category(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .categories
        .delete(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
