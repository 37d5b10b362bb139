use crate::config::{ServiceKind, ServiceSettings};
use crate::export::{
    self, DownloadService, ExportError, HttpDownloadService, MockDownloadService,
};
use crate::generate::{
    success_message, GenerateError, GenerationEvent, GenerationPhase, GenerationService,
    HttpGenerationService, MockGenerationService, UploadFile, COMPLETE_HOLD, FINALIZING_HOLD,
};
use crate::selection::{SelectedFile, Selection, SelectionError, SelectionUpdate};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::time::sleep;

/// The single most-recent successful generation result. Overwritten
/// wholesale by each run; source of truth for the export actions.
#[derive(Debug, Clone)]
pub struct Document {
    pub markup: String,
    pub files_processed: Option<u64>,
    pub generated_at: DateTime<Utc>,
}

/// Owns the two pieces of session state (the live Selection and the cached
/// Document) and drives generation runs. Cloning shares the same state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<RwLock<Inner>>,
    generator: Arc<dyn GenerationService>,
    downloads: Arc<dyn DownloadService>,
}

#[derive(Default)]
struct Inner {
    selection: Selection,
    last_documentation: Option<Document>,
    generating: bool,
}

impl Session {
    pub fn new(generator: Arc<dyn GenerationService>, downloads: Arc<dyn DownloadService>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            generator,
            downloads,
        }
    }

    pub fn from_settings(settings: &ServiceSettings) -> Self {
        match settings.kind {
            ServiceKind::Http => Self::new(
                Arc::new(HttpGenerationService::new(settings.base_url.clone())),
                Arc::new(HttpDownloadService::new(settings.base_url.clone())),
            ),
            ServiceKind::Mock => Self::fake(),
        }
    }

    /// A session backed by the in-process mock services.
    pub fn fake() -> Self {
        Self::new(
            Arc::new(MockGenerationService::new()),
            Arc::new(MockDownloadService::new()),
        )
    }

    /// Replaces the Selection with the eligible members of the picked batch.
    pub fn select_files<I, P>(&self, batch: I) -> Result<SelectionUpdate, SelectionError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.inner.write().selection.replace(batch)
    }

    /// Removes one entry by index; returns true when the selection emptied.
    pub fn remove_file(&self, index: usize) -> bool {
        self.inner.write().selection.remove_at(index)
    }

    pub fn selection(&self) -> Vec<SelectedFile> {
        self.inner.read().selection.files().to_vec()
    }

    pub fn selection_is_empty(&self) -> bool {
        self.inner.read().selection.is_empty()
    }

    pub fn documentation(&self) -> Option<Document> {
        self.inner.read().last_documentation.clone()
    }

    pub fn is_generating(&self) -> bool {
        self.inner.read().generating
    }

    /// Starts a generation run over the current Selection and returns the
    /// event stream for the progress surface.
    ///
    /// Fails with `EmptySelection` before any network activity when nothing
    /// is selected, and with `InFlight` while a prior run is outstanding;
    /// runs are never queued.
    pub fn generate(&self) -> Result<UnboundedReceiver<GenerationEvent>, GenerateError> {
        let batch = {
            let mut inner = self.inner.write();
            if inner.selection.is_empty() {
                return Err(GenerateError::EmptySelection);
            }
            if inner.generating {
                return Err(GenerateError::InFlight);
            }
            inner.generating = true;
            inner.selection.files().to_vec()
        };

        let (tx, rx) = unbounded_channel();
        let session = self.clone();
        tokio::spawn(async move {
            let terminal = session.run_generation(batch, &tx).await;
            session.inner.write().generating = false;
            if let GenerationEvent::Failed { message } = &terminal {
                tracing::warn!(%message, "generation run failed");
            }
            let _ = tx.send(terminal);
        });
        Ok(rx)
    }

    /// Drives one run through the fixed checkpoints and returns the
    /// terminal event. Progress percentages are UI checkpoints; only the
    /// two holds after the response are cosmetic.
    async fn run_generation(
        &self,
        batch: Vec<SelectedFile>,
        tx: &UnboundedSender<GenerationEvent>,
    ) -> GenerationEvent {
        let progress = |phase: GenerationPhase| {
            let _ = tx.send(GenerationEvent::Progress {
                phase,
                message: phase.status_line().to_string(),
            });
        };

        progress(GenerationPhase::Uploading);
        let mut upload = Vec::with_capacity(batch.len());
        for file in &batch {
            match tokio::fs::read(&file.path).await {
                Ok(bytes) => upload.push(UploadFile {
                    name: file.name.clone(),
                    bytes,
                }),
                Err(err) => {
                    return GenerationEvent::Failed {
                        message: format!("Failed to read {}: {err}", file.name),
                    };
                }
            }
        }

        let pending = self.generator.generate(upload);
        progress(GenerationPhase::Analyzing);
        let outcome = match pending.await {
            Ok(outcome) => outcome,
            Err(err) => {
                return GenerationEvent::Failed {
                    message: err.user_message(),
                };
            }
        };

        progress(GenerationPhase::Finalizing);
        sleep(FINALIZING_HOLD).await;
        let _ = tx.send(GenerationEvent::Progress {
            phase: GenerationPhase::Complete,
            message: success_message(outcome.files_processed),
        });
        sleep(COMPLETE_HOLD).await;

        {
            let mut inner = self.inner.write();
            inner.last_documentation = Some(Document {
                markup: outcome.markup,
                files_processed: outcome.files_processed,
                generated_at: Utc::now(),
            });
        }
        GenerationEvent::Completed {
            files_processed: outcome.files_processed,
        }
    }

    /// The cached documentation string for the clipboard. With no cached
    /// result there is nothing the clipboard service can take.
    pub fn clipboard_payload(&self) -> Result<String, ExportError> {
        self.inner
            .read()
            .last_documentation
            .as_ref()
            .map(|document| document.markup.clone())
            .ok_or(ExportError::ClipboardUnavailable)
    }

    /// Runs the two-step download: asks the preparation service to accept
    /// the cached documentation, then materializes the same client-held
    /// string under the fixed filename in `dir`.
    pub async fn download_documentation(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let markup = self
            .documentation()
            .map(|document| document.markup)
            .ok_or_else(|| {
                ExportError::PreparationFailed("No documentation to download.".to_string())
            })?;
        self.downloads.prepare(&markup).await?;
        export::write_download(dir, &markup)
    }
}
