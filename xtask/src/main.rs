use anyhow::Result;
use clap::{Parser, Subcommand};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vellum_core::generate::GenerationEvent;
use vellum_core::session::Session;
use vellum_core::telemetry;

#[derive(Parser, Debug)]
#[command(name = "xtask", version, about = "Automation helpers for Vellum")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a lightweight smoke test that exercises the Vellum core logic.
    Smoke,
}

fn main() -> Result<()> {
    telemetry::init_tracing(EnvFilter::new("info"))?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Smoke => smoke_test(),
    }
}

fn smoke_test() -> Result<()> {
    let runtime = Runtime::new()?;
    let temp_dir = TempDir::new()?;
    let source = temp_dir.path().join("smoke.rs");
    fs::write(&source, "fn main() {}\n")?;

    let session = Arc::new(Session::fake());
    let update = session.select_files([source])?;
    info!("accepted" = update.accepted, "selection replaced");

    runtime.block_on(async {
        let mut rx = session
            .generate()
            .map_err(|err| anyhow::anyhow!(err.user_message()))?;
        while let Some(event) = rx.recv().await {
            match event {
                GenerationEvent::Progress { phase, .. } => {
                    info!("percent" = phase.percent(), "progress checkpoint");
                }
                GenerationEvent::Completed { files_processed } => {
                    info!(?files_processed, "generation complete");
                }
                GenerationEvent::Failed { message } => anyhow::bail!(message),
            }
        }
        Ok::<_, anyhow::Error>(())
    })?;

    let path = runtime
        .block_on(session.download_documentation(temp_dir.path()))
        .map_err(|err| anyhow::anyhow!(err.user_message()))?;
    info!("path" = %path.display(), "smoke artifact saved");

    Ok(())
}
