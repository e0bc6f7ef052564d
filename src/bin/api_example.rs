use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde_json::Value;

use llm_container::web::types::{AskRequest, AskResponse};

/// Exercises the container's REST API the way a client would: health, ask,
/// the legacy generate alias, then a small timing run.
struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let host = dotenvy::var("API_HOST")
            .ok()
            .filter(|h| !h.is_empty() && h != "0.0.0.0")
            .unwrap_or_else(|| "localhost".to_string());
        let port = dotenvy::var("API_PORT").unwrap_or_else(|_| "8000".to_string());
        Self {
            client: reqwest::Client::new(),
            base_url: format!("http://{host}:{port}"),
        }
    }

    async fn health(&self) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .with_context(|| format!("cannot reach {}", self.base_url))?;
        Ok(response.error_for_status()?.json().await?)
    }

    async fn post(&self, path: &str, model: &str, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&AskRequest {
                model: model.to_string(),
                prompt: prompt.to_string(),
            })
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or_default();
            let detail = body
                .get("detail")
                .and_then(Value::as_str)
                .unwrap_or("no detail");
            bail!("{status}: {detail}");
        }
        let body: AskResponse = response.json().await?;
        Ok(body.response)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let api = ApiClient::from_env();
    let model = dotenvy::var("DEFAULT_MODEL").unwrap_or_else(|_| "llama3.2:1b".to_string());

    println!("🚀 LLM container API example ({})", api.base_url);
    println!("{}", "=".repeat(40));

    println!("🔍 Health check");
    let info = api.health().await?;
    println!(
        "✅ {}",
        info.get("message").and_then(Value::as_str).unwrap_or("API is up")
    );
    println!();

    println!("💬 /ask");
    let prompt = "What is the capital of France?";
    println!("Prompt: {prompt}");
    println!("Response: {}\n", api.post("/ask", &model, prompt).await?);

    println!("🕰️  /generate (deprecated alias)");
    let prompt = "Say hello in three languages.";
    println!("Prompt: {prompt}");
    println!("Response: {}\n", api.post("/generate", "local-model", prompt).await?);

    println!("🔀 Another model");
    match api.post("/ask", "llama3.2:3b", "Hello!").await {
        Ok(reply) => println!("Response: {reply}\n"),
        Err(err) => println!("⚠️  {err}\n"),
    }

    println!("⏱️  Performance");
    let prompts = ["Hello!", "What is 2+2?", "Name three colors."];
    let mut total = Duration::ZERO;
    for prompt in prompts {
        let started = Instant::now();
        let reply = api.post("/ask", &model, prompt).await?;
        let elapsed = started.elapsed();
        total += elapsed;
        println!("  {prompt:<20} {:>6.2}s  {} chars", elapsed.as_secs_f64(), reply.len());
    }
    println!(
        "Average: {:.2}s over {} requests",
        total.as_secs_f64() / prompts.len() as f64,
        prompts.len()
    );

    println!("\n✅ Done");
    Ok(())
}
