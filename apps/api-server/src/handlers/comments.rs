//! Comment and reaction handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use pressroom_shared::ApiResponse;
use pressroom_shared::dto::CreateCommentRequest;

use super::views;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/posts/{post_id}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .add_comment(&identity.actor(), path.into_inner(), body.into_inner().comment)
        .await?;

    Ok(HttpResponse::Created().json(views::post(post)))
}

/// DELETE /api/posts/{post_id}/comments/{comment_id}
pub async fn remove_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let post = state
        .posts
        .remove_comment(&identity.actor(), post_id, comment_id)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        views::post(post),
        "Comment deleted successfully",
    )))
}

/// POST /api/posts/{post_id}/like
pub async fn like_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .like_post(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(views::post(post)))
}

/// POST /api/posts/{post_id}/unlike
pub async fn unlike_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .unlike_post(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(views::post(post)))
}

/// POST /api/posts/{post_id}/comments/{comment_id}/like
pub async fn like_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let post = state
        .posts
        .like_comment(&identity.actor(), post_id, comment_id)
        .await?;
    Ok(HttpResponse::Ok().json(views::post(post)))
}

/// POST /api/posts/{post_id}/comments/{comment_id}/unlike
pub async fn unlike_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let post = state
        .posts
        .unlike_comment(&identity.actor(), post_id, comment_id)
        .await?;
    Ok(HttpResponse::Ok().json(views::post(post)))
}
