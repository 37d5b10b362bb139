use clap::{Parser, Subcommand};
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;
use vellum::{load_ui_settings, VellumApp};
use vellum_core::config::ServiceSettings;
use vellum_core::export;
use vellum_core::generate::GenerationEvent;
use vellum_core::session::Session;
use vellum_core::telemetry;

#[derive(Parser, Debug)]
#[command(name = "Vellum", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate documentation for the given files without launching the UI.
    Generate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Directory the artifact is written into (defaults to the working directory).
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    telemetry::init_tracing(EnvFilter::from_default_env())?;
    let cli = Cli::parse();

    let runtime = Arc::new(Runtime::new()?);
    let settings = ServiceSettings::load().map_err(|err| anyhow::anyhow!(err.user_message()))?;
    let session = Arc::new(Session::from_settings(&settings));

    if let Some(Command::Generate { files, out }) = cli.command {
        return runtime.block_on(headless_generate(session, files, out));
    }

    let ui_settings = runtime.block_on(load_ui_settings())?;
    let size = ui_settings.window_size;
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size(egui::vec2(size[0].max(900.0), size[1].max(640.0)))
        .with_min_inner_size(egui::vec2(900.0, 640.0));
    let native_options = eframe::NativeOptions {
        viewport,
        follow_system_theme: true,
        default_theme: ui_settings.theme_mode.fallback_theme(),
        ..Default::default()
    };

    let runtime_for_ui = runtime.clone();
    let mut settings_slot = Some(ui_settings);
    eframe::run_native(
        "Vellum",
        native_options,
        Box::new(move |_cc| {
            let ui_settings = settings_slot.take().expect("UI settings already consumed");
            Box::new(VellumApp::new(
                session.clone(),
                runtime_for_ui.clone(),
                ui_settings,
            ))
        }),
    )
    .map_err(|err| anyhow::anyhow!(err.to_string()))?;

    Ok(())
}

async fn headless_generate(
    session: Arc<Session>,
    files: Vec<PathBuf>,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let update = session
        .select_files(files)
        .map_err(|err| anyhow::anyhow!(err.user_message()))?;
    if let Some(notice) = update.archive_notice() {
        println!("{notice}");
    }

    let mut rx = session
        .generate()
        .map_err(|err| anyhow::anyhow!(err.user_message()))?;
    while let Some(event) = rx.recv().await {
        match event {
            GenerationEvent::Progress { phase, message } => {
                println!("[{:>3}%] {message}", phase.percent());
            }
            GenerationEvent::Completed { .. } => {
                let document = session
                    .documentation()
                    .ok_or_else(|| anyhow::anyhow!("generation completed without a result"))?;
                let dir = out.clone().unwrap_or_else(|| PathBuf::from("."));
                let path = export::write_download(&dir, &document.markup)
                    .map_err(|err| anyhow::anyhow!(err.user_message()))?;
                println!("Saved {}", path.display());
            }
            GenerationEvent::Failed { message } => anyhow::bail!(message),
        }
    }
    Ok(())
}
