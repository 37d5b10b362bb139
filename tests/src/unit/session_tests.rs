use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use vellum_core::export::MockDownloadService;
use vellum_core::generate::{
    GenerateError, GenerationEvent, GenerationOutcome, GenerationPhase, GenerationService,
    MockGenerationService, UploadFile,
};
use vellum_core::session::Session;

fn test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

fn seed_files(dir: &TempDir, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            fs::write(&path, format!("contents of {name}")).expect("seed file");
            path
        })
        .collect()
}

fn mock_session() -> (Session, Arc<MockGenerationService>) {
    let generator = Arc::new(MockGenerationService::new());
    let session = Session::new(generator.clone(), Arc::new(MockDownloadService::new()));
    (session, generator)
}

/// A generation service that always fails the way the remote does: with a
/// message taken from the response body.
struct FailingGenerationService(&'static str);

#[async_trait]
impl GenerationService for FailingGenerationService {
    async fn generate(&self, _batch: Vec<UploadFile>) -> Result<GenerationOutcome, GenerateError> {
        Err(GenerateError::Failed(self.0.to_string()))
    }
}

async fn drain(
    mut rx: tokio::sync::mpsc::UnboundedReceiver<GenerationEvent>,
) -> Vec<GenerationEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[test]
fn empty_selection_never_reaches_the_service() {
    let runtime = test_runtime();
    let (session, generator) = mock_session();

    let err = runtime
        .block_on(async { session.generate() })
        .expect_err("empty selection");
    assert_eq!(err, GenerateError::EmptySelection);
    assert_eq!(generator.calls(), 0);
}

#[test]
fn successful_run_walks_the_fixed_checkpoints_and_caches_the_result() {
    let runtime = test_runtime();
    let dir = TempDir::new().expect("temp dir");
    let (session, generator) = mock_session();
    session
        .select_files(seed_files(&dir, &["a.py", "c.zip"]))
        .expect("selection");

    let events = runtime.block_on(async {
        let rx = session.generate().expect("run starts");
        drain(rx).await
    });

    let checkpoints: Vec<u8> = events
        .iter()
        .filter_map(|event| match event {
            GenerationEvent::Progress { phase, .. } => Some(phase.percent()),
            _ => None,
        })
        .collect();
    assert_eq!(checkpoints, vec![20, 60, 90, 100]);
    assert!(matches!(
        events.last(),
        Some(GenerationEvent::Completed {
            files_processed: Some(2)
        })
    ));

    let complete_message = events
        .iter()
        .find_map(|event| match event {
            GenerationEvent::Progress {
                phase: GenerationPhase::Complete,
                message,
            } => Some(message.clone()),
            _ => None,
        })
        .expect("complete checkpoint");
    assert_eq!(
        complete_message,
        "Documentation generated successfully! Processed 2 files."
    );

    let document = session.documentation().expect("cached document");
    assert!(document.markup.contains("## a.py"));
    assert!(document.markup.contains("## c.zip"));
    assert_eq!(generator.calls(), 1);
    assert!(!session.is_generating());
}

#[test]
fn new_result_fully_replaces_the_cached_documentation() {
    let runtime = test_runtime();
    let dir = TempDir::new().expect("temp dir");
    let (session, _generator) = mock_session();

    session
        .select_files(seed_files(&dir, &["first.rs"]))
        .expect("selection");
    runtime.block_on(async {
        drain(session.generate().expect("first run")).await;
    });

    session
        .select_files(seed_files(&dir, &["second.go"]))
        .expect("selection");
    runtime.block_on(async {
        drain(session.generate().expect("second run")).await;
    });

    let markup = session.documentation().expect("cached document").markup;
    assert!(markup.contains("## second.go"));
    assert!(!markup.contains("first.rs"));
}

#[test]
fn service_failure_surfaces_the_error_message_and_leaves_no_cache() {
    let runtime = test_runtime();
    let dir = TempDir::new().expect("temp dir");
    let session = Session::new(
        Arc::new(FailingGenerationService("bad files")),
        Arc::new(MockDownloadService::new()),
    );
    session
        .select_files(seed_files(&dir, &["a.py"]))
        .expect("selection");

    let events = runtime.block_on(async {
        let rx = session.generate().expect("run starts");
        drain(rx).await
    });

    match events.last() {
        Some(GenerationEvent::Failed { message }) => assert_eq!(message, "bad files"),
        other => panic!("expected failure event, got {other:?}"),
    }
    assert!(session.documentation().is_none());
    assert!(!session.is_generating());
}

#[test]
fn second_generate_while_in_flight_is_rejected() {
    let runtime = test_runtime();
    let dir = TempDir::new().expect("temp dir");
    let (session, generator) = mock_session();
    session
        .select_files(seed_files(&dir, &["a.py"]))
        .expect("selection");

    runtime.block_on(async {
        let rx = session.generate().expect("first run");
        let err = session.generate().expect_err("second run rejected");
        assert_eq!(err, GenerateError::InFlight);
        drain(rx).await;
    });

    // The guard clears once the run finishes.
    assert_eq!(generator.calls(), 1);
    runtime.block_on(async {
        let rx = session.generate().expect("fresh run after completion");
        drain(rx).await;
    });
    assert_eq!(generator.calls(), 2);
}

#[test]
fn clipboard_payload_is_exactly_the_cached_markup() {
    let runtime = test_runtime();
    let dir = TempDir::new().expect("temp dir");
    let (session, _generator) = mock_session();

    assert!(session.clipboard_payload().is_err());

    session
        .select_files(seed_files(&dir, &["a.py"]))
        .expect("selection");
    runtime.block_on(async {
        drain(session.generate().expect("run")).await;
    });

    let payload = session.clipboard_payload().expect("payload");
    assert_eq!(payload, session.documentation().expect("document").markup);
}
