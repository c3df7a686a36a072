//! HTTP handlers and route configuration.

mod auth;
mod categories;
mod comments;
mod health;
mod posts;
mod views;

use actix_web::{error, web};

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| {
        error::Error::from(AppError::BadRequest(err.to_string()))
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _| {
        error::Error::from(AppError::BadRequest(err.to_string()))
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _| {
        error::Error::from(AppError::BadRequest(err.to_string()))
    }))
    .service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            // Posts; literal segments are registered ahead of `/{id}`
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_posts))
                    .route("/search", web::get().to(posts::search_posts))
                    .route("/publish/{id}", web::put().to(posts::publish_post))
                    .service(
                        web::resource("/{id}")
                            .route(web::post().to(posts::create_post))
                            .route(web::get().to(posts::get_post))
                            .route(web::put().to(posts::update_post))
                            .route(web::delete().to(posts::delete_post)),
                    )
                    .route("/{id}/draft", web::put().to(posts::update_draft))
                    .route("/{id}/like", web::post().to(comments::like_post))
                    .route("/{id}/unlike", web::post().to(comments::unlike_post))
                    .route("/{id}/comments", web::post().to(comments::add_comment))
                    .route(
                        "/{id}/comments/{comment_id}",
                        web::delete().to(comments::remove_comment),
                    )
                    .route(
                        "/{id}/comments/{comment_id}/like",
                        web::post().to(comments::like_comment),
                    )
                    .route(
                        "/{id}/comments/{comment_id}/unlike",
                        web::post().to(comments::unlike_comment),
                    ),
            )
            // Categories
            .service(
                web::scope("/categories")
                    .service(
                        web::resource("")
                            .route(web::post().to(categories::create_category))
                            .route(web::get().to(categories::list_categories)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(categories::get_category))
                            .route(web::put().to(categories::update_category))
                            .route(web::delete().to(categories::delete_category)),
                    ),
            ),
    );
}
