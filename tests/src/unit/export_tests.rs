use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use vellum_core::export::{ExportError, MockDownloadService, DOWNLOAD_FILENAME};
use vellum_core::generate::{GenerationEvent, MockGenerationService};
use vellum_core::session::Session;

fn test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

fn session_with_downloads(downloads: Arc<MockDownloadService>) -> Session {
    Session::new(Arc::new(MockGenerationService::new()), downloads)
}

fn seed_cache(runtime: &tokio::runtime::Runtime, session: &Session, dir: &TempDir) {
    let source = dir.path().join("lib.rs");
    fs::write(&source, "pub fn add(a: i32, b: i32) -> i32 { a + b }").expect("seed file");
    session.select_files([source]).expect("selection");
    runtime.block_on(async {
        let mut rx = session.generate().expect("run");
        while let Some(event) = rx.recv().await {
            if let GenerationEvent::Failed { message } = event {
                panic!("seed generation failed: {message}");
            }
        }
    });
}

#[test]
fn download_materializes_exactly_the_cached_string() {
    let runtime = test_runtime();
    let dir = TempDir::new().expect("temp dir");
    let downloads = Arc::new(MockDownloadService::new());
    let session = session_with_downloads(downloads.clone());
    seed_cache(&runtime, &session, &dir);

    let target = TempDir::new().expect("target dir");
    let path = runtime
        .block_on(session.download_documentation(target.path()))
        .expect("download");

    assert_eq!(path.file_name().unwrap(), DOWNLOAD_FILENAME);
    let written = fs::read_to_string(&path).expect("artifact");
    assert_eq!(written, session.documentation().expect("document").markup);
    assert_eq!(downloads.calls(), 1);
}

#[test]
fn preparation_failure_leaves_no_artifact_on_disk() {
    let runtime = test_runtime();
    let dir = TempDir::new().expect("temp dir");
    let downloads = Arc::new(MockDownloadService::failing("service offline"));
    let session = session_with_downloads(downloads.clone());
    seed_cache(&runtime, &session, &dir);

    let target = TempDir::new().expect("target dir");
    let err = runtime
        .block_on(session.download_documentation(target.path()))
        .expect_err("prepare fails");
    match err {
        ExportError::PreparationFailed(message) => assert_eq!(message, "service offline"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!target.path().join(DOWNLOAD_FILENAME).exists());
    assert_eq!(downloads.calls(), 1);
}

#[test]
fn download_without_cached_documentation_never_calls_the_service() {
    let runtime = test_runtime();
    let downloads = Arc::new(MockDownloadService::new());
    let session = session_with_downloads(downloads.clone());

    let target = TempDir::new().expect("target dir");
    let err = runtime
        .block_on(session.download_documentation(target.path()))
        .expect_err("nothing cached");
    assert!(matches!(err, ExportError::PreparationFailed(_)));
    assert_eq!(downloads.calls(), 0);
}
