//! Post handlers: creation, editing and the publication lifecycle.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use pressroom_core::domain::PostFilter;
use pressroom_shared::dto::{
    CreatePostRequest, ListPostsQuery, TagSearchQuery, UpdateDraftRequest, UpdatePostRequest,
};

use super::views;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/posts/{category_id}
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let input = views::new_post(body.into_inner())?;
    let post = state
        .posts
        .create(&identity.actor(), path.into_inner(), input)
        .await?;

    Ok(HttpResponse::Created().json(views::post(post)))
}

/// GET /api/posts
pub async fn list_posts(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let filter = PostFilter {
        category_id: query.category,
        ..Default::default()
    };
    let posts = state.posts.list(viewer.actor().as_ref(), filter).await?;

    Ok(HttpResponse::Ok().json(views::posts(posts)))
}

/// GET /api/posts/search?tag=...
pub async fn search_posts(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    query: web::Query<TagSearchQuery>,
) -> AppResult<HttpResponse> {
    let posts = state
        .posts
        .search_by_tag(viewer.actor().as_ref(), query.tag.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(views::posts(posts)))
}

/// GET /api/posts/{post_id}
pub async fn get_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.posts.get(&identity.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(views::post(post)))
}

/// PUT /api/posts/{post_id}
pub async fn update_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let changes = views::post_changes(body.into_inner());
    let post = state
        .posts
        .update(&identity.actor(), path.into_inner(), changes)
        .await?;

    Ok(HttpResponse::Ok().json(views::post(post)))
}

/// DELETE /api/posts/{post_id}
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .delete(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// PUT /api/posts/publish/{post_id}
pub async fn publish_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .publish_now(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(views::post(post)))
}

/// PUT /api/posts/{post_id}/draft
pub async fn update_draft(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdateDraftRequest>,
) -> AppResult<HttpResponse> {
    let changes = views::draft_changes(body.into_inner())?;
    let post = state
        .posts
        .update_draft(&identity.actor(), path.into_inner(), changes)
        .await?;

    Ok(HttpResponse::Ok().json(views::post(post)))
}
