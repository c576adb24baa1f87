//! HTTP server for the push relay
//!
//! Browsers fetch the VAPID key and register subscriptions here; backends
//! post notifications to `/send` to fan them out.

pub mod routes;
pub mod state;

pub use state::ServerAppState;

use crate::config::{ConfigError, RelayConfig};
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, Any, CorsLayer};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Build the CORS layer.
///
/// With explicit origins, credentials are allowed, so methods and headers
/// mirror the request instead of using a wildcard.
pub fn build_cors(origins: &[String]) -> Result<CorsLayer, ConfigError> {
    if origins.is_empty() {
        // Permissive CORS: allow any origin (default for development)
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let allowed_origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|_| ConfigError::InvalidOrigin(o.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Build the router with all relay endpoints
pub fn build_router(state: ServerAppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(routes::index_handler))
        .route("/health", get(routes::health_handler))
        .route(
            "/vapid/public",
            get(routes::push_routes::vapid_public_key_handler),
        )
        .route("/subscribe", post(routes::push_routes::subscribe_handler))
        .route("/send", post(routes::push_routes::send_handler))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server until a shutdown is requested
pub async fn run_server(config: &RelayConfig, state: ServerAppState) -> Result<(), ServerError> {
    let cors = build_cors(&config.cors_origins)?;
    let addr = config.socket_addr()?;
    let app = build_router(state.clone(), cors);

    let cors_display = if config.cors_origins.is_empty() {
        "*".to_string()
    } else {
        config.cors_origins.join(", ")
    };

    log::info!("push-relay v{}", env!("CARGO_PKG_VERSION"));
    log::info!("  CORS origins: {}", cors_display);
    log::info!("  VAPID contact: {}", config.credentials.subject);
    log::info!("  Endpoints: GET /vapid/public, POST /subscribe, POST /send, GET /health");

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    log::info!("Server listening on http://{}", addr);

    let shutdown_state = state.shutdown_state.clone();
    let shutdown_signal = async move {
        shutdown_state.wait().await;
        log::info!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(ServerError::Serve)
}
