//! HTTP surface of the edge service: thin proxy routes in front of the
//! Wearsearch backend plus the presigned image resolver.

pub mod cookies;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, HeaderName, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use routes::security::CSRF_HEADER;

pub use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(CSRF_HEADER)])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/translate", post(routes::translate::translate))
        .route(
            "/api/currency",
            get(routes::preferences::get_currency).post(routes::preferences::set_currency),
        )
        .route(
            "/api/language",
            get(routes::preferences::get_language).post(routes::preferences::set_language),
        )
        .route("/api/affiliate/click", post(routes::affiliate::affiliate_click))
        .route("/api/og", get(routes::og::og_image))
        .route(
            "/api/images/resolve",
            get(routes::images::resolve_image).post(routes::images::resolve_images),
        )
        .route("/api/csrf-token", get(routes::security::issue_csrf_token))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::security::csrf_guard,
        ))
        .layer(cors)
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C or SIGTERM.
pub async fn serve(config: &impl ConfigProvider) -> Result<()> {
    let state = AppState::from_config(config)?;
    let address = config.listen_addr();
    let listener = TcpListener::bind(&address).await?;

    tracing::info!(
        "Wearsearch edge listening on http://{} (backend {}, csrf {})",
        address,
        state.backend.base_url(),
        if state.config.csrf_enabled { "on" } else { "off" }
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
