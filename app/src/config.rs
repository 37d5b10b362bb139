use crate::ui::ThemeMode;
use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    #[serde(default)]
    pub theme_mode: ThemeMode,
    #[serde(default = "UiSettings::default_window_size")]
    pub window_size: [f32; 2],
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            theme_mode: ThemeMode::default(),
            window_size: UiSettings::default_window_size(),
        }
    }
}

impl UiSettings {
    fn default_window_size() -> [f32; 2] {
        [1100.0, 780.0]
    }
}

pub async fn load_ui_settings() -> Result<UiSettings> {
    let path = ui_settings_path();
    match tokio::fs::read_to_string(&path).await {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(settings) => Ok(settings),
            Err(err) => {
                let defaults = UiSettings::default();
                save_ui_settings(&defaults).await?;
                warn!(
                    error = ?err,
                    "failed to parse ui_settings.json, resetting to defaults"
                );
                Ok(defaults)
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let defaults = UiSettings::default();
            save_ui_settings(&defaults).await?;
            Ok(defaults)
        }
        Err(err) => Err(err).context("failed to read ui_settings.json"),
    }
}

pub async fn save_ui_settings(settings: &UiSettings) -> Result<()> {
    let path = ui_settings_path();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(settings)?;
    tokio::fs::write(&path, serialized)
        .await
        .with_context(|| format!("failed to write ui_settings.json at {}", path.display()))
}

fn ui_settings_path() -> PathBuf {
    config_dir().join("ui_settings.json")
}

fn config_dir() -> PathBuf {
    if let Some(base) = BaseDirs::new() {
        base.config_dir().join("vellum")
    } else {
        PathBuf::from(".vellum")
    }
}
