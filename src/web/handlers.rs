use std::collections::BTreeMap;
use std::time::Instant;

use axum::{extract::State, Json};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::types::{AskRequest, AskResponse, HealthStatus, ServiceInfo};
use super::AppState;
use crate::daemon::types::GenerateRequest;
use crate::daemon::ModelDaemon;
use crate::Error;

const SERVICE_NAME: &str = "llm-container";
/// Placeholder model name older clients still send.
const LEGACY_MODEL: &str = "local-model";

/// POST /ask
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, Error> {
    let request_id = Uuid::new_v4();
    let model = match req.model.trim() {
        "" | LEGACY_MODEL => state.default_model().to_string(),
        named => named.to_string(),
    };

    info!(%request_id, model = %model, prompt_len = req.prompt.len(), "generation requested");
    let started = Instant::now();

    let reply = state
        .daemon()
        .generate(&GenerateRequest::new(model.clone(), req.prompt))
        .await
        .map_err(|err| {
            error!(%request_id, model = %model, error = %err, "generation failed");
            err
        })?;

    info!(
        %request_id,
        model = %model,
        elapsed_ms = started.elapsed().as_millis() as u64,
        eval_count = reply.eval_count,
        "generation finished"
    );

    Ok(Json(AskResponse {
        response: reply.response,
    }))
}

/// POST /generate, kept for older tooling.
pub async fn generate(
    state: State<AppState>,
    req: Json<AskRequest>,
) -> Result<Json<AskResponse>, Error> {
    warn!("POST /generate is deprecated, use POST /ask");
    ask(state, req).await
}

/// GET /
pub async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    let endpoints = BTreeMap::from([
        ("ask", "POST /ask - send a prompt to the model"),
        ("generate", "POST /generate - deprecated alias of /ask"),
        ("health", "GET /health - service and daemon health"),
    ]);

    Json(ServiceInfo {
        message: "Ollama LLM container is up",
        name: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        default_model: state.default_model().to_string(),
        daemon: state.daemon().base_url().to_string(),
        started_at: state.started_at(),
        endpoints,
    })
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let daemon = match state.daemon().status().await {
        Ok(_) => "up",
        Err(err) => {
            warn!(error = %err, "daemon status check failed");
            "down"
        }
    };

    Json(HealthStatus {
        status: "healthy",
        service: SERVICE_NAME,
        daemon,
    })
}
