use crate::config::{save_ui_settings, UiSettings};
use crate::ui::{
    Advisory, AdvisoryDialog, DropZone, FileList, OutputPanel, ProgressPanel, ThemeMode,
    ThemePalette,
};
use egui::{self, Align, Layout, RichText};
use egui_commonmark::CommonMarkCache;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::warn;
use vellum_core::export;
use vellum_core::generate::{GenerateError, GenerationEvent};
use vellum_core::selection::SUPPORTED_EXTENSIONS;
use vellum_core::session::Session;

struct ProgressState {
    percent: u8,
    message: String,
}

enum ExportMessage {
    Downloaded(PathBuf),
    DownloadFailed(String),
}

pub struct VellumApp {
    session: Arc<Session>,
    runtime: Arc<Runtime>,
    settings: UiSettings,
    markdown_cache: CommonMarkCache,
    generation_rx: Option<UnboundedReceiver<GenerationEvent>>,
    progress: Option<ProgressState>,
    advisory: Option<Advisory>,
    export_tx: UnboundedSender<ExportMessage>,
    export_rx: UnboundedReceiver<ExportMessage>,
    scroll_to_output: bool,
}

impl VellumApp {
    pub fn new(session: Arc<Session>, runtime: Arc<Runtime>, settings: UiSettings) -> Self {
        let (export_tx, export_rx) = unbounded_channel();
        Self {
            session,
            runtime,
            settings,
            markdown_cache: CommonMarkCache::default(),
            generation_rx: None,
            progress: None,
            advisory: None,
            export_tx,
            export_rx,
            scroll_to_output: false,
        }
    }

    /// Applies one picking gesture. The batch replaces the prior
    /// Selection wholesale; it never appends.
    fn handle_picked(&mut self, batch: Vec<PathBuf>) {
        if batch.is_empty() {
            return;
        }
        match self.session.select_files(batch) {
            Ok(update) => {
                if let Some(notice) = update.archive_notice() {
                    self.advisory = Some(Advisory::info("Folder Upload Detected", notice));
                }
            }
            Err(err) => {
                self.advisory = Some(Advisory::error("No Valid Files", err.user_message()));
            }
        }
    }

    fn browse_files(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter("Supported files", SUPPORTED_EXTENSIONS)
            .pick_files();
        if let Some(paths) = picked {
            self.handle_picked(paths);
        }
    }

    fn start_generation(&mut self) {
        match self.session.generate() {
            Ok(rx) => {
                self.generation_rx = Some(rx);
                self.progress = Some(ProgressState {
                    percent: 0,
                    message: "Starting…".to_string(),
                });
            }
            Err(err) => {
                self.advisory = Some(match &err {
                    GenerateError::EmptySelection => {
                        Advisory::error("No Files Selected", err.user_message())
                    }
                    GenerateError::InFlight => {
                        Advisory::info("Generation In Progress", err.user_message())
                    }
                    GenerateError::Failed(_) => {
                        Advisory::error("Generation Failed", err.user_message())
                    }
                });
            }
        }
    }

    fn copy_documentation(&mut self, ctx: &egui::Context) {
        match self.session.clipboard_payload() {
            Ok(text) => {
                ctx.output_mut(|out| out.copied_text = text);
                self.advisory = Some(Advisory::success(
                    "Copied!",
                    "Documentation has been copied to clipboard.",
                ));
            }
            Err(err) => {
                self.advisory = Some(Advisory::error("Copy Failed", err.user_message()));
            }
        }
    }

    fn start_download(&mut self) {
        let session = self.session.clone();
        let tx = self.export_tx.clone();
        self.runtime.spawn(async move {
            let result = session
                .download_documentation(&export::download_target_dir())
                .await;
            let message = match result {
                Ok(path) => ExportMessage::Downloaded(path),
                Err(err) => ExportMessage::DownloadFailed(err.user_message()),
            };
            if tx.send(message).is_err() {
                warn!("UI has been dropped before download completion");
            }
        });
    }

    fn persist_settings(&self) {
        let settings = self.settings.clone();
        self.runtime.spawn(async move {
            if let Err(err) = save_ui_settings(&settings).await {
                warn!(%err, "failed to persist ui settings");
            }
        });
    }

    fn process_background_events(&mut self) {
        if let Some(rx) = self.generation_rx.as_mut() {
            let mut finished = false;
            while let Ok(event) = rx.try_recv() {
                match event {
                    GenerationEvent::Progress { phase, message } => {
                        self.progress = Some(ProgressState {
                            percent: phase.percent(),
                            message,
                        });
                    }
                    GenerationEvent::Completed { .. } => {
                        self.progress = None;
                        self.scroll_to_output = true;
                        finished = true;
                    }
                    GenerationEvent::Failed { message } => {
                        self.progress = None;
                        self.advisory = Some(Advisory::error("Generation Failed", message));
                        finished = true;
                    }
                }
            }
            if finished {
                self.generation_rx = None;
            }
        }

        while let Ok(message) = self.export_rx.try_recv() {
            match message {
                ExportMessage::Downloaded(path) => {
                    self.advisory = Some(Advisory::success(
                        "Downloaded!",
                        format!("Documentation has been saved as {}", path.display()),
                    ));
                }
                ExportMessage::DownloadFailed(message) => {
                    self.advisory = Some(Advisory::error("Download Failed", message));
                }
            }
        }
    }
}

impl eframe::App for VellumApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_background_events();

        let dark = match self.settings.theme_mode {
            ThemeMode::Light => false,
            ThemeMode::Dark => true,
            ThemeMode::System => ctx.style().visuals.dark_mode,
        };
        let palette = if dark {
            ThemePalette::for_dark()
        } else {
            ThemePalette::for_light()
        };
        ctx.set_visuals(palette.visuals(dark));

        // Keep polling the event channels while a run is outstanding.
        if self.generation_rx.is_some() || self.progress.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        let dropped: Vec<PathBuf> = ctx.input(|input| {
            input
                .raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if !dropped.is_empty() {
            self.handle_picked(dropped);
        }
        let hovering_files = ctx.input(|input| !input.raw.hovered_files.is_empty());

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Vellum");
                ui.label(
                    RichText::new("Generate documentation from your source files")
                        .color(palette.text_secondary)
                        .small(),
                );
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    egui::ComboBox::from_id_source("theme_selector")
                        .selected_text(self.settings.theme_mode.label())
                        .show_ui(ui, |ui| {
                            for mode in ThemeMode::ALL {
                                if ui
                                    .selectable_label(
                                        self.settings.theme_mode == mode,
                                        mode.label(),
                                    )
                                    .clicked()
                                    && self.settings.theme_mode != mode
                                {
                                    self.settings.theme_mode = mode;
                                    self.persist_settings();
                                }
                            }
                        });
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    let drop_output = DropZone::show(ui, &palette, hovering_files);
                    if drop_output.browse {
                        self.browse_files();
                    }

                    let files = self.session.selection();
                    if !files.is_empty() {
                        ui.add_space(12.0);
                        let list_output = FileList::show(ui, &palette, &files);
                        if let Some(index) = list_output.remove {
                            self.session.remove_file(index);
                        }

                        ui.add_space(10.0);
                        if ui.button("⚙ Generate Documentation").clicked() {
                            self.start_generation();
                        }
                    }

                    if let Some(progress) = &self.progress {
                        ui.add_space(12.0);
                        ProgressPanel::show(ui, &palette, progress.percent, &progress.message);
                    }

                    if let Some(document) = self.session.documentation() {
                        ui.add_space(12.0);
                        let scoped = ui.scope(|ui| {
                            OutputPanel::show(ui, &palette, &document, &mut self.markdown_cache)
                        });
                        if scoped.inner.copy {
                            self.copy_documentation(ctx);
                        }
                        if scoped.inner.download {
                            self.start_download();
                        }
                        if self.scroll_to_output {
                            scoped.response.scroll_to_me(Some(Align::Min));
                            self.scroll_to_output = false;
                        }
                    }
                });
        });

        AdvisoryDialog::show(ctx, &palette, &mut self.advisory);
    }
}
