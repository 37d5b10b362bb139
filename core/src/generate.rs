use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

/// Multipart field name the generation service expects every file under.
pub const FILES_FIELD: &str = "files";

/// Cosmetic hold between the 90% and 100% checkpoints. Decoupled from any
/// network completion signal.
pub const FINALIZING_HOLD: Duration = Duration::from_millis(500);

/// Cosmetic hold after the 100% checkpoint before the result is handed to
/// the output surface.
pub const COMPLETE_HOLD: Duration = Duration::from_millis(1000);

/// One file of the outbound batch, already read into memory.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Successful response of the generation service.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub markup: String,
    pub files_processed: Option<u64>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("no files selected")]
    EmptySelection,
    #[error("a generation run is already in flight")]
    InFlight,
    #[error("{0}")]
    Failed(String),
}

impl GenerateError {
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptySelection => "Please select files to generate documentation.".to_string(),
            Self::InFlight => {
                "A documentation run is already in progress. Wait for it to finish.".to_string()
            }
            Self::Failed(message) => message.clone(),
        }
    }
}

/// Progress checkpoints of a generation run. Percentages are fixed UI
/// checkpoints, not server-reported telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    Uploading,
    Analyzing,
    Finalizing,
    Complete,
}

impl GenerationPhase {
    pub fn percent(self) -> u8 {
        match self {
            Self::Uploading => 20,
            Self::Analyzing => 60,
            Self::Finalizing => 90,
            Self::Complete => 100,
        }
    }

    pub fn status_line(self) -> &'static str {
        match self {
            Self::Uploading => "Uploading files to server...",
            Self::Analyzing => "Analyzing files and generating documentation...",
            Self::Finalizing => "Finalizing documentation...",
            Self::Complete => "Documentation generated successfully!",
        }
    }
}

/// Success status line citing the processed-file count when the service
/// reported one.
pub fn success_message(files_processed: Option<u64>) -> String {
    let count = files_processed
        .map(|count| count.to_string())
        .unwrap_or_else(|| "multiple".to_string());
    format!("Documentation generated successfully! Processed {count} files.")
}

/// Events a generation run feeds back to the UI, in order: a `Progress`
/// per checkpoint, then exactly one `Completed` or `Failed`.
#[derive(Debug, Clone)]
pub enum GenerationEvent {
    Progress {
        phase: GenerationPhase,
        message: String,
    },
    Completed {
        files_processed: Option<u64>,
    },
    Failed {
        message: String,
    },
}

/// Seam to the remote documentation-generation service.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, batch: Vec<UploadFile>) -> Result<GenerationOutcome, GenerateError>;
}

/// reqwest-backed client for the real service.
pub struct HttpGenerationService {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpGenerationService {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    documentation: String,
    #[serde(default)]
    files_processed: Option<u64>,
}

#[derive(Deserialize, Default)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
}

const GENERIC_FAILURE: &str = "Failed to generate documentation";

/// Extracts the `error` field from a failure body, falling back to the
/// given generic message.
pub(crate) fn failure_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|response| response.error)
        .unwrap_or_else(|| fallback.to_string())
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn generate(&self, batch: Vec<UploadFile>) -> Result<GenerationOutcome, GenerateError> {
        let url = self
            .base_url
            .join("generate-documentation")
            .map_err(|err| GenerateError::Failed(err.to_string()))?;

        let mut form = reqwest::multipart::Form::new();
        for file in batch {
            let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.name);
            form = form.part(FILES_FIELD, part);
        }

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| GenerateError::Failed(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| GenerateError::Failed(err.to_string()))?;
        if !status.is_success() {
            return Err(GenerateError::Failed(failure_message(
                &body,
                GENERIC_FAILURE,
            )));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|err| GenerateError::Failed(format!("invalid service response: {err}")))?;
        Ok(GenerationOutcome {
            markup: parsed.documentation,
            files_processed: parsed.files_processed,
        })
    }
}

/// In-process stand-in for the remote service. Used by the smoke tooling
/// and tests; also selectable via `VELLUM_SERVICE=mock` for offline runs.
#[derive(Default)]
pub struct MockGenerationService {
    calls: AtomicUsize,
}

impl MockGenerationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `generate` has been invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationService for MockGenerationService {
    async fn generate(&self, batch: Vec<UploadFile>) -> Result<GenerationOutcome, GenerateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        sleep(Duration::from_millis(20)).await;
        let mut markup = String::from("# Project Documentation\n");
        for file in &batch {
            markup.push_str(&format!(
                "\n## {}\n\nPlaceholder documentation ({} bytes).\n",
                file.name,
                file.bytes.len()
            ));
        }
        Ok(GenerationOutcome {
            markup,
            files_processed: Some(batch.len() as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_checkpoints_are_fixed() {
        assert_eq!(GenerationPhase::Uploading.percent(), 20);
        assert_eq!(GenerationPhase::Analyzing.percent(), 60);
        assert_eq!(GenerationPhase::Finalizing.percent(), 90);
        assert_eq!(GenerationPhase::Complete.percent(), 100);
    }

    #[test]
    fn success_message_cites_count_or_falls_back() {
        assert_eq!(
            success_message(Some(3)),
            "Documentation generated successfully! Processed 3 files."
        );
        assert_eq!(
            success_message(None),
            "Documentation generated successfully! Processed multiple files."
        );
    }

    #[test]
    fn failure_message_prefers_error_field() {
        assert_eq!(
            failure_message(r#"{"error": "bad files"}"#, GENERIC_FAILURE),
            "bad files"
        );
        assert_eq!(failure_message("not json", GENERIC_FAILURE), GENERIC_FAILURE);
        assert_eq!(failure_message("{}", GENERIC_FAILURE), GENERIC_FAILURE);
    }

    #[tokio::test]
    async fn mock_service_documents_every_file() {
        let service = MockGenerationService::new();
        let outcome = service
            .generate(vec![
                UploadFile {
                    name: "a.py".into(),
                    bytes: b"print(1)".to_vec(),
                },
                UploadFile {
                    name: "b.rs".into(),
                    bytes: b"fn main() {}".to_vec(),
                },
            ])
            .await
            .expect("mock outcome");
        assert!(outcome.markup.contains("## a.py"));
        assert!(outcome.markup.contains("## b.rs"));
        assert_eq!(outcome.files_processed, Some(2));
        assert_eq!(service.calls(), 1);
    }
}
