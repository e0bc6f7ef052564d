//! Test doubles for the model daemon: an in-memory fake for orchestration
//! and an HTTP mock for client and API tests.

use std::convert::Infallible;
use std::sync::{
    atomic::{AtomicU32, AtomicUsize, Ordering},
    Arc, Mutex,
};

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::Instant;

use crate::daemon::{ModelDaemon, ModelInfo};
use crate::{Error, Result};

pub struct FakeDaemon {
    /// Status succeeds from this call number on (1-based); `None` never.
    ready_on: Option<u32>,
    models: Vec<String>,
    pull_fails: bool,
    status_calls: Mutex<Vec<Instant>>,
    list_calls: AtomicU32,
    pulls: Mutex<Vec<String>>,
}

impl FakeDaemon {
    pub fn ready_on(call: u32) -> Self {
        Self {
            ready_on: Some(call),
            models: Vec::new(),
            pull_fails: false,
            status_calls: Mutex::new(Vec::new()),
            list_calls: AtomicU32::new(0),
            pulls: Mutex::new(Vec::new()),
        }
    }

    pub fn never_ready() -> Self {
        Self {
            ready_on: None,
            ..Self::ready_on(1)
        }
    }

    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = models.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn failing_pulls(mut self) -> Self {
        self.pull_fails = true;
        self
    }

    pub fn status_calls(&self) -> Vec<Instant> {
        self.status_calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn pulls(&self) -> Vec<String> {
        self.pulls.lock().unwrap().clone()
    }
}

impl ModelDaemon for FakeDaemon {
    async fn status(&self) -> Result<String> {
        let call = {
            let mut calls = self.status_calls.lock().unwrap();
            calls.push(Instant::now());
            calls.len() as u32
        };
        match self.ready_on {
            Some(ready) if call >= ready => Ok("0.0.0-fake".into()),
            _ => Err(Error::Daemon {
                status: 503,
                message: "starting".into(),
            }),
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .models
            .iter()
            .map(|name| ModelInfo {
                name: name.clone(),
                model: Some(name.clone()),
                modified_at: None,
                size: 0,
                digest: None,
            })
            .collect())
    }

    async fn pull(&self, model: &str) -> Result<()> {
        self.pulls.lock().unwrap().push(model.to_string());
        if self.pull_fails {
            return Err(Error::Pull {
                model: model.to_string(),
                reason: "registry unreachable".into(),
            });
        }
        Ok(())
    }
}

/// Ollama look-alike bound to an ephemeral loopback port.
pub struct MockDaemon {
    pub base_url: String,
    pub generate_calls: Arc<AtomicUsize>,
}

pub async fn spawn_mock_daemon() -> MockDaemon {
    let generate_calls = Arc::new(AtomicUsize::new(0));
    let counter = generate_calls.clone();

    let app = Router::new()
        .route(
            "/api/version",
            get(|| async { Json(json!({ "version": "0.0.0-mock" })) }),
        )
        .route(
            "/api/tags",
            get(|| async {
                Json(json!({
                    "models": [
                        { "name": "m:latest", "model": "m:latest", "size": 42 },
                        { "name": "llama3.2:1b", "model": "llama3.2:1b", "size": 1300000000u64 }
                    ]
                }))
            }),
        )
        .route("/api/pull", post(mock_pull))
        .route(
            "/api/generate",
            post(move |Json(body): Json<Value>| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    mock_generate(body)
                }
            }),
        )
        .route("/api/chat", post(mock_chat))
        .route("/api/show", post(mock_show));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockDaemon {
        base_url: format!("http://{addr}"),
        generate_calls,
    }
}

/// A loopback port nothing is listening on.
pub fn dead_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Loopback URL with nothing listening behind it.
pub fn dead_url() -> String {
    format!("http://127.0.0.1:{}", dead_port())
}

fn field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn mock_generate(body: Value) -> axum::response::Response {
    let model = field(&body, "model");
    let prompt = field(&body, "prompt");
    let system = field(&body, "system");
    let streaming = body.get("stream").and_then(Value::as_bool).unwrap_or(false);
    match model {
        "boom" if streaming => ndjson(vec![
            json!({ "model": model, "response": "par", "done": false }),
            json!({ "error": "llama runner process has terminated" }),
        ]),
        "boom" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "llama runner process has terminated" })),
        )
            .into_response(),
        "ghost" => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "model \"ghost\" not found, try pulling it first" })),
        )
            .into_response(),
        _ => {
            let text = match (model, prompt, system) {
                ("m", "hi", _) => "hello".to_string(),
                (_, _, "") => format!("{model} says: {prompt}"),
                _ => format!("[{system}] {model} says: {prompt}"),
            };
            if streaming {
                let chars: Vec<char> = text.chars().collect();
                let mut lines: Vec<Value> = chars
                    .chunks(4)
                    .map(|part| {
                        let part: String = part.iter().collect();
                        json!({ "model": model, "response": part, "done": false })
                    })
                    .collect();
                lines.push(json!({ "model": model, "response": "", "done": true }));
                ndjson(lines)
            } else {
                Json(json!({ "model": model, "response": text, "done": true })).into_response()
            }
        }
    }
}

/// NDJSON body delivered in small pieces that cut through lines and
/// multi-byte characters.
fn ndjson(lines: Vec<Value>) -> axum::response::Response {
    let mut bytes = Vec::new();
    for line in lines {
        bytes.extend_from_slice(line.to_string().as_bytes());
        bytes.push(b'\n');
    }
    let pieces: Vec<std::result::Result<Vec<u8>, Infallible>> =
        bytes.chunks(7).map(|piece| Ok(piece.to_vec())).collect();
    (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(futures_util::stream::iter(pieces)),
    )
        .into_response()
}

async fn mock_pull(Json(body): Json<Value>) -> axum::response::Response {
    match field(&body, "model") {
        "missing" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "pull model manifest: file does not exist" })),
        )
            .into_response(),
        "odd" => Json(json!({ "status": "verifying sha256 digest" })).into_response(),
        _ => Json(json!({ "status": "success" })).into_response(),
    }
}

async fn mock_chat(Json(body): Json<Value>) -> Json<Value> {
    let last = body
        .get("messages")
        .and_then(Value::as_array)
        .and_then(|messages| messages.last())
        .map(|m| field(m, "content").to_string())
        .unwrap_or_default();
    Json(json!({
        "model": field(&body, "model"),
        "message": { "role": "assistant", "content": format!("re: {last}") },
        "done": true
    }))
}

async fn mock_show(Json(body): Json<Value>) -> axum::response::Response {
    if field(&body, "model") == "ghost" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "model 'ghost' not found" })),
        )
            .into_response();
    }
    Json(json!({
        "details": {
            "format": "gguf",
            "family": "llama",
            "parameter_size": "1.2B",
            "quantization_level": "Q8_0"
        }
    }))
    .into_response()
}
