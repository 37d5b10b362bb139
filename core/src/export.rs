use crate::generate::failure_message;
use async_trait::async_trait;
use directories::UserDirs;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// Fixed name of the materialized artifact.
pub const DOWNLOAD_FILENAME: &str = "project-documentation.md";

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("clipboard unavailable")]
    ClipboardUnavailable,
    #[error("{0}")]
    PreparationFailed(String),
    #[error("failed to write download")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn user_message(&self) -> String {
        match self {
            Self::ClipboardUnavailable => {
                "Failed to copy documentation to clipboard.".to_string()
            }
            Self::PreparationFailed(message) => message.clone(),
            Self::Io(err) => format!("Failed to save {DOWNLOAD_FILENAME}: {err}"),
        }
    }
}

/// Seam to the remote download-preparation service. Only the call's
/// success or failure is consumed; the response body is not used.
#[async_trait]
pub trait DownloadService: Send + Sync {
    async fn prepare(&self, documentation: &str) -> Result<(), ExportError>;
}

#[derive(Serialize)]
struct PrepareRequest<'a> {
    documentation: &'a str,
}

const GENERIC_FAILURE: &str = "Failed to prepare download";

pub struct HttpDownloadService {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpDownloadService {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl DownloadService for HttpDownloadService {
    async fn prepare(&self, documentation: &str) -> Result<(), ExportError> {
        let url = self
            .base_url
            .join("download-documentation")
            .map_err(|err| ExportError::PreparationFailed(err.to_string()))?;
        let response = self
            .client
            .post(url)
            .json(&PrepareRequest { documentation })
            .send()
            .await
            .map_err(|err| ExportError::PreparationFailed(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ExportError::PreparationFailed(failure_message(
            &body,
            GENERIC_FAILURE,
        )))
    }
}

/// In-process stand-in for the remote service, used by tests and the
/// offline mock mode.
#[derive(Default)]
pub struct MockDownloadService {
    calls: AtomicUsize,
    fail_with: Option<String>,
}

impl MockDownloadService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose `prepare` always fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_with: Some(message.into()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DownloadService for MockDownloadService {
    async fn prepare(&self, _documentation: &str) -> Result<(), ExportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(message) => Err(ExportError::PreparationFailed(message.clone())),
            None => Ok(()),
        }
    }
}

/// The user's download directory, falling back to the working directory.
pub fn download_target_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Materializes the cached documentation under the fixed filename.
/// The content is the client-held string exactly, not anything the
/// preparation service returned.
pub fn write_download(dir: &Path, documentation: &str) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(DOWNLOAD_FILENAME);
    fs::write(&path, documentation)?;
    Ok(path)
}
