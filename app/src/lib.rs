pub mod app;
pub mod config;
pub mod ui;

pub use app::VellumApp;
pub use config::{load_ui_settings, save_ui_settings, UiSettings};
