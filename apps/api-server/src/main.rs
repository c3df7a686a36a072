//! # Pressroom API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use api_server::config::AppConfig;
use api_server::handlers;
use api_server::observability::RequestIdMiddleware;
use api_server::state::AppState;
use api_server::telemetry::{TelemetryConfig, init_telemetry};
use pressroom_core::ports::{PasswordService, TokenService};
use pressroom_infra::{Argon2PasswordService, JwtTokenService};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Pressroom API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(config.database.as_ref(), config.scheduler.clone()).await;

    let token_service: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_env());
    let password_service: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

    if let Some(admin) = &config.bootstrap_admin {
        state
            .bootstrap_admin(admin, password_service.as_ref())
            .await?;
    }

    // Re-arm timers for posts scheduled before the last shutdown
    let recovered = state.scheduler.recover().await?;
    tracing::info!(recovered, "Publication scheduler ready");

    let scheduler = state.scheduler.clone();
    let app_state = web::Data::new(state);
    let tokens = web::Data::new(token_service);
    let passwords = web::Data::new(password_service);

    HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .app_data(app_state.clone())
            .app_data(tokens.clone())
            .app_data(passwords.clone())
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    scheduler.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}
