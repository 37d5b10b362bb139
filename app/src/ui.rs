use chrono::{DateTime, Local, Utc};
use egui::{self, Align, Align2, Color32, Frame, Layout, Margin, RichText, Stroke, Vec2};
use egui_commonmark::{CommonMarkCache, CommonMarkViewer};
use serde::{Deserialize, Serialize};
use vellum_core::selection::SelectedFile;
use vellum_core::session::Document;

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    System,
    Light,
    Dark,
}

impl ThemeMode {
    pub const ALL: [ThemeMode; 3] = [ThemeMode::System, ThemeMode::Light, ThemeMode::Dark];

    pub fn label(self) -> &'static str {
        match self {
            ThemeMode::System => "System",
            ThemeMode::Light => "Light",
            ThemeMode::Dark => "Dark",
        }
    }

    pub fn fallback_theme(self) -> eframe::Theme {
        match self {
            ThemeMode::Light => eframe::Theme::Light,
            ThemeMode::System | ThemeMode::Dark => eframe::Theme::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemePalette {
    pub background: Color32,
    pub surface: Color32,
    pub accent: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub border: Color32,
    pub warning: Color32,
    pub success: Color32,
    pub drop_highlight: Color32,
}

impl ThemePalette {
    pub fn for_dark() -> Self {
        Self {
            background: color_from_hex("#1E1E1E"),
            surface: color_from_hex("#2D2D30"),
            accent: color_from_hex("#0078D7"),
            text_primary: color_from_hex("#E6E6E6"),
            text_secondary: color_from_hex("#B0B0B0"),
            border: color_from_hex("#3B3B3B"),
            warning: color_from_hex("#C63C3C"),
            success: color_from_hex("#1CB960"),
            drop_highlight: color_from_hex("#24364A"),
        }
    }

    pub fn for_light() -> Self {
        Self {
            background: color_from_hex("#FFFFFF"),
            surface: color_from_hex("#F6F6F6"),
            accent: color_from_hex("#0063B1"),
            text_primary: color_from_hex("#202020"),
            text_secondary: color_from_hex("#5F5F5F"),
            border: color_from_hex("#D0D0D0"),
            warning: color_from_hex("#B02020"),
            success: color_from_hex("#178A48"),
            drop_highlight: color_from_hex("#E2EEF9"),
        }
    }

    pub fn visuals(&self, dark_mode: bool) -> egui::Visuals {
        let mut visuals = if dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        visuals.window_fill = self.surface;
        visuals.panel_fill = self.background;
        visuals.extreme_bg_color = self.surface;
        visuals.widgets.noninteractive.bg_fill = self.surface;
        visuals.widgets.noninteractive.fg_stroke.color = self.text_primary;
        visuals.widgets.active.fg_stroke.color = self.text_primary;
        visuals.widgets.inactive.fg_stroke.color = self.text_primary;
        visuals.dark_mode = dark_mode;
        visuals
    }
}

fn color_from_hex(hex: &str) -> Color32 {
    let trimmed = hex.trim_start_matches('#');
    if trimmed.len() == 6 {
        if let Ok(value) = u32::from_str_radix(trimmed, 16) {
            let r = ((value >> 16) & 0xFF) as u8;
            let g = ((value >> 8) & 0xFF) as u8;
            let b = (value & 0xFF) as u8;
            return Color32::from_rgb(r, g, b);
        }
    }
    Color32::WHITE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisorySeverity {
    Info,
    Success,
    Error,
}

impl AdvisorySeverity {
    pub fn symbol(self) -> &'static str {
        match self {
            AdvisorySeverity::Info => "ℹ",
            AdvisorySeverity::Success => "✔",
            AdvisorySeverity::Error => "⚠",
        }
    }

    pub fn color(self, palette: &ThemePalette) -> Color32 {
        match self {
            AdvisorySeverity::Info => palette.accent,
            AdvisorySeverity::Success => palette.success,
            AdvisorySeverity::Error => palette.warning,
        }
    }
}

/// One user-facing notice. Every error an action raises ends up here;
/// nothing propagates past the dialog.
#[derive(Debug, Clone)]
pub struct Advisory {
    pub severity: AdvisorySeverity,
    pub title: String,
    pub message: String,
}

impl Advisory {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: AdvisorySeverity::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: AdvisorySeverity::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: AdvisorySeverity::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

pub struct AdvisoryDialog;

impl AdvisoryDialog {
    /// Shows the pending advisory, if any, as a centered modal with a
    /// single OK button that dismisses it.
    pub fn show(ctx: &egui::Context, palette: &ThemePalette, advisory: &mut Option<Advisory>) {
        let Some(current) = advisory.clone() else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new("advisory")
            .title_bar(false)
            .resizable(false)
            .collapsible(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .frame(
                Frame::window(&ctx.style())
                    .fill(palette.surface)
                    .stroke(Stroke::new(1.0, palette.border)),
            )
            .show(ctx, |ui| {
                ui.set_min_width(300.0);
                ui.vertical_centered(|ui| {
                    ui.label(
                        RichText::new(current.severity.symbol())
                            .size(32.0)
                            .color(current.severity.color(palette)),
                    );
                    ui.add_space(4.0);
                    ui.label(RichText::new(&current.title).heading());
                    ui.add_space(4.0);
                    ui.label(RichText::new(&current.message).color(palette.text_secondary));
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            });
        if dismissed {
            *advisory = None;
        }
    }
}

#[derive(Default)]
pub struct DropZoneOutput {
    pub browse: bool,
}

pub struct DropZone;

impl DropZone {
    pub fn show(ui: &mut egui::Ui, palette: &ThemePalette, hovering_files: bool) -> DropZoneOutput {
        let mut output = DropZoneOutput::default();
        let fill = if hovering_files {
            palette.drop_highlight
        } else {
            palette.surface
        };
        let stroke_color = if hovering_files {
            palette.accent
        } else {
            palette.border
        };
        Frame::none()
            .fill(fill)
            .rounding(8.0)
            .stroke(Stroke::new(1.5, stroke_color))
            .inner_margin(Margin::symmetric(16.0, 28.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new("🗁").size(36.0).color(palette.accent));
                    ui.label(
                        RichText::new("Drag & drop code files or ZIP folders here").strong(),
                    );
                    ui.label(
                        RichText::new("Source, config and text files are supported")
                            .color(palette.text_secondary)
                            .small(),
                    );
                    ui.add_space(8.0);
                    if ui.button("Browse files…").clicked() {
                        output.browse = true;
                    }
                });
            });
        output
    }
}

#[derive(Default)]
pub struct FileListOutput {
    pub remove: Option<usize>,
}

pub struct FileList;

impl FileList {
    pub fn show(
        ui: &mut egui::Ui,
        palette: &ThemePalette,
        files: &[SelectedFile],
    ) -> FileListOutput {
        let mut output = FileListOutput::default();
        ui.label(RichText::new("Selected Files").strong());
        ui.add_space(4.0);
        for (index, file) in files.iter().enumerate() {
            Frame::none()
                .fill(palette.surface)
                .rounding(6.0)
                .stroke(Stroke::new(1.0, palette.border))
                .inner_margin(Margin::symmetric(10.0, 6.0))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        let icon = if file.is_archive() { "🗀" } else { "🖹" };
                        ui.label(RichText::new(icon).color(palette.accent));
                        ui.vertical(|ui| {
                            ui.label(RichText::new(&file.name).strong());
                            let suffix = if file.is_archive() { " (Folder)" } else { "" };
                            ui.label(
                                RichText::new(format!("{}{suffix}", file.display_size()))
                                    .color(palette.text_secondary)
                                    .small(),
                            );
                        });
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            if ui
                                .button(RichText::new("🗑").color(palette.warning))
                                .on_hover_text("Remove file")
                                .clicked()
                            {
                                output.remove = Some(index);
                            }
                        });
                    });
                });
            ui.add_space(4.0);
        }
        output
    }
}

pub struct ProgressPanel;

impl ProgressPanel {
    pub fn show(ui: &mut egui::Ui, palette: &ThemePalette, percent: u8, message: &str) {
        Frame::none()
            .fill(palette.surface)
            .rounding(6.0)
            .stroke(Stroke::new(1.0, palette.border))
            .inner_margin(Margin::symmetric(12.0, 10.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(message).color(palette.text_secondary));
                ui.add_space(4.0);
                ui.add(
                    egui::ProgressBar::new(f32::from(percent) / 100.0)
                        .show_percentage()
                        .animate(true),
                );
            });
    }
}

#[derive(Default)]
pub struct OutputPanelOutput {
    pub copy: bool,
    pub download: bool,
}

pub struct OutputPanel;

impl OutputPanel {
    /// Mounts the cached documentation into the output surface. The markup
    /// is trusted as produced by the generation service; the CommonMark
    /// viewer renders text content only, so no sanitization happens here.
    pub fn show(
        ui: &mut egui::Ui,
        palette: &ThemePalette,
        document: &Document,
        markdown_cache: &mut CommonMarkCache,
    ) -> OutputPanelOutput {
        let mut output = OutputPanelOutput::default();
        ui.horizontal(|ui| {
            ui.label(RichText::new("Generated Documentation").heading());
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.button("⬇ Download").clicked() {
                    output.download = true;
                }
                if ui.button("🗐 Copy").clicked() {
                    output.copy = true;
                }
            });
        });
        let processed = document
            .files_processed
            .map(|count| format!(" · {count} files processed"))
            .unwrap_or_default();
        ui.label(
            RichText::new(format!(
                "Generated {}{processed}",
                format_timestamp(document.generated_at)
            ))
            .color(palette.text_secondary)
            .small(),
        );
        ui.add_space(6.0);
        Frame::none()
            .fill(palette.surface)
            .rounding(6.0)
            .stroke(Stroke::new(1.0, palette.border))
            .inner_margin(Margin::symmetric(14.0, 10.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                CommonMarkViewer::new("documentation_output").show(
                    ui,
                    markdown_cache,
                    &document.markup,
                );
            });
        output
    }
}

fn format_timestamp(time: DateTime<Utc>) -> String {
    let local: DateTime<Local> = DateTime::from(time);
    local.format("%b %e, %H:%M").to_string()
}
