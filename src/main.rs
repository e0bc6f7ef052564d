use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use llm_container::orchestrator::{self, Mode};
use llm_container::Settings;

/// Container entrypoint: starts the model daemon, waits for it, pulls the
/// default model and hands over to the selected mode.
#[derive(Parser)]
#[command(name = "llm-container", version)]
struct Cli {
    /// Talk to an already running daemon instead of spawning `ollama serve`
    #[arg(long)]
    attach: bool,

    /// Mode (`api`, `daemon-only`, `shell`, `script CMD...`) or a command to run
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "MODE")]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // .env is read here, so RUST_LOG may come from it too
    let mut settings = Settings::from_env().context("invalid configuration")?;
    settings.attach |= cli.attach;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mode = Mode::from_args(&cli.args)?;

    println!("🚀 Starting LLM container in {mode} mode");
    println!("🦙 Model daemon at {}", settings.daemon.base_url());
    if let Some(model) = &settings.default_model {
        println!("📦 Default model: {model}");
    }

    orchestrator::run(settings, mode).await?;
    Ok(())
}
