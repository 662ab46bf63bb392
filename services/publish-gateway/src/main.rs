//! Telegraph publish gateway
//!
//! Single-binary Rust service that:
//! 1. Validates or provisions the configured Telegraph accounts
//! 2. Sizes the publish gate from the usable account count
//! 3. Accepts `POST /pages` and publishes through the pool
//! 4. Reports pool state on `/health` and Prometheus metrics on `/metrics`

mod config;
mod error;
mod metrics;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use telegraph::{HttpClient, TelegraphApi};
use telegraph_pool::{AccountLimits, AccountPool, ConcurrencyGate, PageDraft, Publisher};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, TelegraphConfig};

/// Time allowed for in-flight publishes to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state accessible from all handlers
#[derive(Clone)]
struct AppState {
    publisher: Arc<Publisher>,
    prometheus: PrometheusHandle,
}

/// Body of `POST /pages`
#[derive(Debug, Deserialize)]
struct PublishRequest {
    html: String,
    title: Option<String>,
    link: Option<String>,
    feed_title: Option<String>,
    author: Option<String>,
}

impl PublishRequest {
    fn into_draft(self) -> PageDraft {
        let mut draft = PageDraft::new(self.html);
        if let Some(title) = self.title {
            draft = draft.title(title);
        }
        if let Some(link) = self.link {
            draft = draft.link(link);
        }
        if let Some(feed_title) = self.feed_title {
            draft = draft.feed_title(feed_title);
        }
        if let Some(author) = self.author {
            draft = draft.author(author);
        }
        draft
    }
}

/// Build the axum router with all routes and shared state.
///
/// `max_connections` caps concurrent HTTP requests; the publish gate inside
/// the publisher separately caps concurrent Telegraph calls.
fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/pages", post(publish_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

/// Validate the configured accounts and wrap them in a gated publisher.
///
/// Never fails: with no usable account the service keeps running and every
/// publish is answered with 503.
async fn build_publisher(api: Arc<dyn TelegraphApi>, config: &TelegraphConfig) -> Publisher {
    let profile = config.profile();
    let tokens: Vec<String> = config
        .tokens
        .iter()
        .map(|t| t.expose().to_owned())
        .collect();

    let pool = AccountPool::connect(api, &tokens, profile.clone(), AccountLimits::default()).await;

    if tokens.is_empty() {
        warn!("no telegraph tokens configured, publishing is disabled");
    } else if !pool.valid() {
        error!(
            configured = tokens.len(),
            "cannot set up any telegraph account, publishing is disabled"
        );
    }

    let gate = ConcurrencyGate::for_pool(Some(&pool), config.default_concurrency);
    info!(
        accounts = pool.count(),
        capacity = gate.capacity(),
        "publisher ready"
    );

    Publisher::new(Arc::new(pool), gate, profile)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting publish-gateway");

    // Install Prometheus metrics recorder before any metrics are emitted
    let prometheus_handle =
        metrics::install_recorder().context("failed to install Prometheus recorder")?;

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        listen_addr = %config.server.listen_addr,
        api_url = %config.telegraph.api_url,
        tokens = config.telegraph.tokens.len(),
        proxy = config.telegraph.proxy.is_some(),
        "configuration loaded"
    );

    let client = HttpClient::new(config.telegraph.client_options())
        .context("failed to build telegraph client")?;
    let publisher = build_publisher(Arc::new(client), &config.telegraph).await;

    let app_state = AppState {
        publisher: Arc::new(publisher),
        prometheus: prometheus_handle,
    };
    let app = build_router(app_state, config.server.max_connections);

    let listen_addr = config.server.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "accepting requests");

    // The drain timeout starts when the shutdown signal fires, not when the
    // server starts.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => info!("all in-flight requests drained"),
        Ok(Ok(Err(e))) => error!(error = %e, "server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "server task panicked"),
        Err(_) => warn!(
            drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "drain timeout exceeded, forcing shutdown"
        ),
    }

    info!("shutdown complete");
    Ok(())
}

/// JSON error body: {"error":{"type":"...","message":"...","request_id":"req_..."}}
fn error_response(status: StatusCode, kind: &str, message: &str, request_id: &str) -> Response {
    let body = serde_json::json!({
        "error": {
            "type": kind,
            "message": message,
            "request_id": request_id,
        }
    });
    (status, [(CONTENT_TYPE, "application/json")], body.to_string()).into_response()
}

/// HTTP status and error type for a failed publish.
fn classify(err: &telegraph_pool::Error) -> (StatusCode, &'static str) {
    match err {
        telegraph_pool::Error::NotConfigured => (StatusCode::SERVICE_UNAVAILABLE, "not_configured"),
        telegraph_pool::Error::GateClosed => (StatusCode::SERVICE_UNAVAILABLE, "gate_closed"),
        telegraph_pool::Error::Overflow { .. } => (StatusCode::TOO_MANY_REQUESTS, "flood_overflow"),
        telegraph_pool::Error::Api(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
    }
}

/// Health endpoint: 200 with pool and gate state when publishing is
/// possible, 503 when no account is usable.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let pool = state.publisher.pool();
    let gate = state.publisher.gate();

    let (status_code, status) = if pool.valid() {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "disabled")
    };

    let body = serde_json::json!({
        "status": status,
        "accounts": pool.count(),
        "capacity": gate.capacity(),
        "available_permits": gate.available(),
    });

    (
        status_code,
        [(CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus metrics endpoint, text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.prometheus.render(),
    )
}

async fn publish_handler(
    State(state): State<AppState>,
    Json(request): Json<PublishRequest>,
) -> Response {
    let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
    let started = Instant::now();

    let result = state.publisher.publish(request.into_draft()).await;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(url) => {
            metrics::record_publish("ok", elapsed);
            info!(%request_id, %url, elapsed_secs = elapsed, "page published");
            (StatusCode::OK, Json(serde_json::json!({ "url": url }))).into_response()
        }
        Err(e) => {
            let (status, kind) = classify(&e);
            metrics::record_publish(kind, elapsed);
            warn!(%request_id, error = %e, status = status.as_u16(), "publish failed");
            error_response(status, kind, &e.to_string(), &request_id)
        }
    }
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
