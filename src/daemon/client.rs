use std::time::Duration;

use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::types::{
    ChatRequest, ChatResponse, DaemonErrorBody, GenerateRequest, GenerateResponse,
    ListModelsResponse, ModelInfo, PullRequest, PullResponse, ShowRequest, ShowResponse,
    VersionResponse,
};
use super::stream::{GenerateChunk, NdjsonLines};
use super::ModelDaemon;
use crate::config::DaemonSettings;
use crate::{Error, Result};

const STATUS_TIMEOUT: Duration = Duration::from_secs(2);

/// HTTP client for the model-serving daemon.
///
/// Cheap to clone; all clones share one connection pool. Only the status
/// call carries a timeout: pulls and generations run until the daemon
/// answers.
#[derive(Clone)]
pub struct DaemonClient {
    client: reqwest::Client,
    base_url: String,
}

impl DaemonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn from_settings(settings: &DaemonSettings) -> Self {
        Self::new(settings.base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn version(&self) -> Result<String> {
        let response = self
            .client
            .get(self.url("/api/version"))
            .timeout(STATUS_TIMEOUT)
            .send()
            .await?;
        let body: VersionResponse = decode(response, None).await?;
        Ok(body.version)
    }

    pub async fn tags(&self) -> Result<Vec<ModelInfo>> {
        let response = self.client.get(self.url("/api/tags")).send().await?;
        let body: ListModelsResponse = decode(response, None).await?;
        Ok(body.models)
    }

    /// Blocking (non-streaming) pull. Fails unless the daemon reports success.
    pub async fn pull_model(&self, model: &str) -> Result<()> {
        let outcome = async {
            let response = self
                .client
                .post(self.url("/api/pull"))
                .json(&PullRequest {
                    model,
                    stream: false,
                })
                .send()
                .await?;
            let body: PullResponse = decode(response, Some(model)).await?;
            Ok::<_, Error>(body.status)
        }
        .await;

        match outcome {
            Ok(status) if status == "success" => Ok(()),
            Ok(status) => Err(Error::Pull {
                model: model.to_string(),
                reason: format!("daemon reported status '{status}'"),
            }),
            Err(err) => Err(Error::Pull {
                model: model.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        debug!(model = %request.model, prompt_len = request.prompt.len(), "daemon generate");
        let mut request = request.clone();
        request.stream = false;
        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&request)
            .send()
            .await?;
        decode(response, Some(&request.model)).await
    }

    /// Streaming generation. Each item is one text fragment in arrival
    /// order; an `Err` item ends the stream. The channel closes once the
    /// daemon sends `done`.
    pub async fn generate_stream(
        &self,
        request: &GenerateRequest,
    ) -> Result<mpsc::Receiver<Result<String>>> {
        debug!(model = %request.model, prompt_len = request.prompt.len(), "daemon generate (stream)");
        let mut request = request.clone();
        request.stream = true;
        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from(response, Some(&request.model)).await);
        }

        let status = response.status().as_u16();
        let (tx, rx) = mpsc::channel(128);
        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut lines = NdjsonLines::default();
            while let Some(next) = body.next().await {
                let bytes = match next {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        let _ = tx.send(Err(err.into())).await;
                        return;
                    }
                };
                for line in lines.push(&bytes) {
                    if !forward_chunk(&tx, &line, status).await {
                        return;
                    }
                }
            }
            if let Some(line) = lines.finish() {
                forward_chunk(&tx, &line, status).await;
            }
        });
        Ok(rx)
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let mut request = request.clone();
        request.stream = false;
        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&request)
            .send()
            .await?;
        decode(response, Some(&request.model)).await
    }

    pub async fn show(&self, model: &str) -> Result<ShowResponse> {
        let response = self
            .client
            .post(self.url("/api/show"))
            .json(&ShowRequest { model })
            .send()
            .await?;
        decode(response, Some(model)).await
    }
}

impl ModelDaemon for DaemonClient {
    async fn status(&self) -> Result<String> {
        self.version().await
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        self.tags().await
    }

    async fn pull(&self, model: &str) -> Result<()> {
        self.pull_model(model).await
    }
}

/// Send one NDJSON line down the channel. Returns `false` once the stream
/// is over: `done`, an error line, or a receiver that went away.
async fn forward_chunk(tx: &mpsc::Sender<Result<String>>, line: &[u8], status: u16) -> bool {
    let chunk: GenerateChunk = match serde_json::from_slice(line) {
        Ok(chunk) => chunk,
        Err(err) => {
            let _ = tx.send(Err(err.into())).await;
            return false;
        }
    };
    if let Some(message) = chunk.error {
        warn!(%message, "daemon failed mid-stream");
        let _ = tx.send(Err(Error::Daemon { status, message })).await;
        return false;
    }
    if !chunk.response.is_empty() && tx.send(Ok(chunk.response)).await.is_err() {
        return false;
    }
    !chunk.done
}

/// Turn a daemon reply into `T`, or into the matching error.
async fn decode<T: DeserializeOwned>(response: reqwest::Response, model: Option<&str>) -> Result<T> {
    if response.status().is_success() {
        let bytes = response.bytes().await?;
        return Ok(serde_json::from_slice(&bytes)?);
    }
    Err(error_from(response, model).await)
}

/// A 404 on a model-scoped call means the daemon does not know the model.
async fn error_from(response: reqwest::Response, model: Option<&str>) -> Error {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<DaemonErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);

    match model {
        Some(model) if status == reqwest::StatusCode::NOT_FOUND => {
            Error::ModelNotFound(model.to_string())
        }
        _ => Error::Daemon {
            status: status.as_u16(),
            message,
        },
    }
}
