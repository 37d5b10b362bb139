use egui::RawInput;
use vellum::ui::{
    Advisory, AdvisorySeverity, DropZone, FileList, ProgressPanel, ThemeMode, ThemePalette,
};
use vellum_core::selection::SelectedFile;

fn sample_files() -> Vec<SelectedFile> {
    vec![
        SelectedFile::from_path("a.py").expect("source file"),
        SelectedFile::from_path("bundle.zip").expect("archive"),
    ]
}

#[test]
fn palette_visuals_follow_the_requested_mode() {
    let dark = ThemePalette::for_dark().visuals(true);
    assert!(dark.dark_mode);
    let light = ThemePalette::for_light().visuals(false);
    assert!(!light.dark_mode);
}

#[test]
fn theme_mode_labels_cover_every_variant() {
    let labels: Vec<&str> = ThemeMode::ALL.iter().map(|mode| mode.label()).collect();
    assert_eq!(labels, vec!["System", "Light", "Dark"]);
}

#[test]
fn advisory_constructors_set_severity() {
    assert_eq!(
        Advisory::info("t", "m").severity,
        AdvisorySeverity::Info
    );
    assert_eq!(
        Advisory::success("t", "m").severity,
        AdvisorySeverity::Success
    );
    assert_eq!(
        Advisory::error("t", "m").severity,
        AdvisorySeverity::Error
    );
}

#[test]
fn panels_render_without_emitting_actions() {
    let ctx = egui::Context::default();
    let palette = ThemePalette::for_dark();
    let files = sample_files();
    let _ = ctx.run(RawInput::default(), |ctx| {
        egui::CentralPanel::default().show(ctx, |ui| {
            let drop_output = DropZone::show(ui, &palette, false);
            assert!(!drop_output.browse);

            let list_output = FileList::show(ui, &palette, &files);
            assert!(list_output.remove.is_none());

            ProgressPanel::show(ui, &palette, 60, "Analyzing files and generating documentation...");
        });
    });
}
