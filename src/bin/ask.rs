use anyhow::Result;
use clap::Parser;
use serde_json::json;

use llm_container::daemon::{types::GenerateRequest, DaemonClient};
use llm_container::Settings;

/// Query the running model daemon once.
#[derive(Parser)]
#[command(name = "llm-ask", version)]
struct Args {
    /// Prompt to send to the model
    prompt: String,

    /// Model identifier (defaults to DEFAULT_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// System prompt sent along with the prompt
    #[arg(long)]
    system: Option<String>,

    /// Print {"response": ...} instead of plain text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::from_env()?;

    let model = args
        .model
        .filter(|m| !m.trim().is_empty() && m != "local-model")
        .unwrap_or_else(|| settings.fallback_model().to_string());

    let client = DaemonClient::from_settings(&settings.daemon);
    let mut request = GenerateRequest::new(model, args.prompt);
    if let Some(system) = args.system.filter(|s| !s.trim().is_empty()) {
        request = request.with_system(system);
    }

    let reply = tokio::select! {
        reply = client.generate(&request) => reply?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted");
            std::process::exit(130);
        }
    };

    if args.json {
        println!("{}", json!({ "response": reply.response }));
    } else {
        println!("{}", reply.response);
    }
    Ok(())
}
