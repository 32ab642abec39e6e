//! Dwitter server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{Router, middleware};
use dwitter_api::{AppState, auth_middleware, router as api_router};
use dwitter_common::Config;
use dwitter_core::{DweetService, FeedService, GraphService, UserService};
use dwitter_db::repositories::{
    DweetRepository, FollowingRepository, ProfileRepository, UserRepository,
};
use sea_orm::DatabaseConnection;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Wire repositories and services into the shared API state.
fn build_state(db: Arc<DatabaseConnection>, config: &Config) -> AppState {
    let user_repo = UserRepository::new(Arc::clone(&db));
    let profile_repo = ProfileRepository::new(Arc::clone(&db));
    let following_repo = FollowingRepository::new(Arc::clone(&db));
    let dweet_repo = DweetRepository::new(Arc::clone(&db));

    let graph_service = GraphService::new(db, profile_repo.clone(), following_repo);
    let user_service = UserService::new(user_repo.clone(), graph_service.clone());
    let dweet_service = DweetService::new(
        dweet_repo.clone(),
        profile_repo.clone(),
        graph_service.clone(),
    );
    let feed_service = FeedService::new(graph_service.clone(), dweet_repo, user_repo, profile_repo);

    AppState {
        user_service,
        graph_service,
        dweet_service,
        feed_service,
        feed_max_limit: config.feed.max_limit,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dwitter=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting dwitter server...");

    let config = Config::load().context("failed to load configuration")?;

    let db = dwitter_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    dwitter_db::migrate(&db).await?;
    info!("Migrations completed");

    let state = build_state(Arc::new(db), &config);

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server.host or server.port")?;
    info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
