use std::io::Write;

use anyhow::{Context, Result};

use llm_container::daemon::types::{ChatRequest, GenerateRequest, Message};
use llm_container::daemon::{DaemonClient, ModelDaemon};
use llm_container::Settings;

/// Walks through the daemon API against the default model: list, generate,
/// stream, chat and show.
#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env()?;
    let model = settings.fallback_model().to_string();
    let client = DaemonClient::from_settings(&settings.daemon);

    println!("🦙 Ollama direct interaction ({})", client.base_url());
    println!("{}", "=".repeat(40));

    let models = client
        .list_models()
        .await
        .context("is the daemon running?")?;
    println!("📋 Available models: {}", models.len());
    for m in &models {
        println!("  - {} ({} bytes)", m.name, m.size);
    }
    println!();

    println!("🔥 Simple generation");
    let prompt = "Explain what a container is in one sentence.";
    println!("Prompt: {prompt}");
    let reply = client.generate(&GenerateRequest::new(&model, prompt)).await?;
    println!("Response: {}\n", reply.response);

    println!("🌊 Streaming response");
    let prompt = "Write a haiku about programming.";
    println!("Prompt: {prompt}");
    print!("Response: ");
    let mut chunks = client
        .generate_stream(&GenerateRequest::new(&model, prompt))
        .await?;
    let mut stdout = std::io::stdout();
    while let Some(chunk) = chunks.recv().await {
        print!("{}", chunk?);
        stdout.flush()?;
    }
    println!("\n");

    println!("💬 Chat conversation");
    let chat = ChatRequest {
        model: model.clone(),
        messages: vec![
            Message::user("What is Docker?"),
            Message::assistant("Docker is a containerization platform."),
            Message::user("How does it differ from virtual machines?"),
        ],
        stream: false,
    };
    let reply = client.chat(&chat).await?;
    println!("{}\n", reply.message.content);

    println!("ℹ️  Model information");
    let info = client.show(&model).await?;
    let or_unknown = |s: &str| if s.is_empty() { "Unknown".to_string() } else { s.to_string() };
    println!("Model: {}", or_unknown(&info.details.family));
    println!("Parameters: {}", or_unknown(&info.details.parameter_size));
    println!("Quantization: {}", or_unknown(&info.details.quantization_level));
    println!("Format: {}", or_unknown(&info.details.format));

    println!("\n✅ Done");
    Ok(())
}
