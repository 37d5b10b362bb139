use directories::BaseDirs;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use url::Url;

/// Default endpoint of the documentation-generation backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/";

/// Which implementation backs the two remote-service seams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Http,
    Mock,
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: Url,
    pub kind: ServiceKind,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("service configuration invalid: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(detail) => {
                format!("Service not configured—{detail}. Update vellum.yaml.")
            }
        }
    }
}

impl ServiceSettings {
    /// Resolves settings from the environment (`VELLUM_SERVICE_URL`,
    /// `VELLUM_SERVICE`), then `vellum.yaml`, then the built-in default.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let env_url = std::env::var("VELLUM_SERVICE_URL").ok();
        let env_kind = std::env::var("VELLUM_SERVICE").ok();
        let file = match locate_config_file() {
            Some(path) => {
                let contents = fs::read_to_string(&path).map_err(|err| {
                    ConfigError::Invalid(format!("failed to read {}: {err}", path.display()))
                })?;
                let config: VellumConfig = serde_yaml::from_str(&contents)
                    .map_err(|err| ConfigError::Invalid(format!("invalid vellum.yaml: {err}")))?;
                config.service
            }
            None => None,
        };
        resolve_settings(env_url, env_kind, file)
    }
}

fn resolve_settings(
    env_url: Option<String>,
    env_kind: Option<String>,
    file: Option<ServiceSection>,
) -> Result<ServiceSettings, ConfigError> {
    let kind = match env_kind {
        Some(value) if value.eq_ignore_ascii_case("mock") => ServiceKind::Mock,
        Some(value) if value.eq_ignore_ascii_case("http") => ServiceKind::Http,
        Some(value) => {
            return Err(ConfigError::Invalid(format!(
                "unknown VELLUM_SERVICE value '{value}'"
            )))
        }
        None => file
            .as_ref()
            .and_then(|section| section.kind)
            .unwrap_or(ServiceKind::Http),
    };

    let raw_url = env_url
        .or_else(|| file.and_then(|section| section.base_url))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    Ok(ServiceSettings {
        base_url: parse_base_url(&raw_url)?,
        kind,
    })
}

/// Parses a base URL, appending the trailing slash `Url::join` needs so
/// endpoint paths extend it instead of replacing its last segment.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid("empty service URL".to_string()));
    }
    let mut normalized = trimmed.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized)
        .map_err(|err| ConfigError::Invalid(format!("invalid service URL '{trimmed}': {err}")))
}

fn locate_config_file() -> Option<PathBuf> {
    config_file_candidates()
        .into_iter()
        .find(|path| path.exists())
}

fn config_file_candidates() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(base) = BaseDirs::new() {
        let config_dir = base.config_dir().join("vellum");
        paths.push(config_dir.join("vellum.yaml"));
        paths.push(config_dir.join("vellum.yml"));
        let home_dir = base.home_dir();
        paths.push(home_dir.join(".vellum").join("vellum.yaml"));
        paths.push(home_dir.join(".vellum").join("vellum.yml"));
    } else {
        paths.push(PathBuf::from("vellum.yaml"));
        paths.push(PathBuf::from("vellum.yml"));
    }
    paths
}

#[derive(Debug, Deserialize)]
struct VellumConfig {
    service: Option<ServiceSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceSection {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    kind: Option<ServiceKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_environment_or_file() {
        let settings = resolve_settings(None, None, None).expect("defaults");
        assert_eq!(settings.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(settings.kind, ServiceKind::Http);
    }

    #[test]
    fn environment_url_overrides_file() {
        let settings = resolve_settings(
            Some("http://env.example:9000".to_string()),
            None,
            Some(ServiceSection {
                base_url: Some("http://file.example".to_string()),
                kind: None,
            }),
        )
        .expect("settings");
        assert_eq!(settings.base_url.as_str(), "http://env.example:9000/");
    }

    #[test]
    fn file_kind_applies_when_environment_is_silent() {
        let settings = resolve_settings(
            None,
            None,
            Some(ServiceSection {
                base_url: None,
                kind: Some(ServiceKind::Mock),
            }),
        )
        .expect("settings");
        assert_eq!(settings.kind, ServiceKind::Mock);
        assert_eq!(settings.base_url.as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn unknown_service_kind_is_invalid() {
        let err = resolve_settings(None, Some("carrier-pigeon".to_string()), None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn invalid_url_is_reported_with_detail() {
        let err = resolve_settings(Some("not a url".to_string()), None, None).unwrap_err();
        let ConfigError::Invalid(detail) = err;
        assert!(detail.contains("not a url"));
    }

    #[test]
    fn base_url_gains_trailing_slash_for_joins() {
        let url = parse_base_url("http://localhost:5000").expect("url");
        let endpoint = url.join("generate-documentation").expect("join");
        assert_eq!(
            endpoint.as_str(),
            "http://localhost:5000/generate-documentation"
        );
    }
}
