use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::{info, Level};

use crate::config::ApiSettings;
use crate::daemon::DaemonClient;
use crate::shutdown::shutdown_signal;
use crate::Result;

pub mod handlers;
pub mod types;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    daemon: DaemonClient,
    default_model: String,
    started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(daemon: DaemonClient, default_model: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                daemon,
                default_model: default_model.into(),
                started_at: Utc::now(),
            }),
        }
    }

    pub fn daemon(&self) -> &DaemonClient {
        &self.inner.daemon
    }

    pub fn default_model(&self) -> &str {
        &self.inner.default_model
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/ask", post(handlers::ask))
        .route("/generate", post(handlers::generate))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
}

/// Serve the API until Ctrl-C or SIGTERM.
pub async fn serve(settings: &ApiSettings, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(settings.addr()).await?;
    let addr = listener.local_addr()?;

    println!("🌐 API listening on http://{addr}");
    info!(%addr, daemon = %state.daemon().base_url(), "API server started");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}
