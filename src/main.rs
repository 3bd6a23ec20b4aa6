use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod errors;
mod handlers;
mod models;
mod registry;
mod validation;

use registry::CodeRegistry;

// ── Shared application state ───────────────────────────────────────────────

pub struct AppState {
    pub config: config::AppConfig,
    /// Sole owner of every short link. Lives as long as the server does;
    /// nothing is persisted across restarts.
    pub registry: CodeRegistry,
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (ignore error if file is absent — env vars may already be set)
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "linkforge=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = config::AppConfig::from_env()?;
    tracing::info!("Starting Linkforge on {}:{}", config.host, config.port);
    tracing::info!("Base URL: {}", config.base_url);
    tracing::info!("CORS origin: {}", config.cors_origin);

    let bind_addr = config.bind_addr();
    let state = Arc::new(AppState {
        config,
        registry: CodeRegistry::new(),
    });

    let app = app(state.clone())?;

    // ── Serve ──────────────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(
        "Shut down; discarding {} registered link(s)",
        state.registry.len()
    );
    Ok(())
}

// ── Router ─────────────────────────────────────────────────────────────────

pub fn app(state: Arc<AppState>) -> anyhow::Result<Router> {
    let origin = state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .context("CORS_ORIGIN must be a valid header value")?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let api_router = Router::new()
        .route("/encode", post(handlers::api::encode))
        .route("/decode/:code", get(handlers::api::decode))
        .route("/statistic/:code", get(handlers::api::statistic))
        .route("/list", get(handlers::api::list))
        .route("/search", get(handlers::api::search));

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api", api_router)
        // Short-link redirect and delete — static routes above take priority
        .route(
            "/:code",
            get(handlers::redirect::redirect).delete(handlers::api::remove),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "status": "ok", "links": state.registry.len() }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
