//! End-to-end tests for the HTTP API.
//!
//! Each test binds a real server on an ephemeral port and talks to it with
//! `reqwest`, using stub engines in place of the analysis pipeline. Every
//! server stages into its own scratch directory so leaked artifacts show up
//! as leftover files.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use docaudit_core::AnalysisResult;
use docaudit_engine::{AnalysisEngine, AnalysisError, AnalysisInvoker};
use docaudit_server::{Gateway, Server, ServerResult, ShutdownSignal, UploadLimits};
use docaudit_staging::StagingManager;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

// ---------------------------------------------------------------------------
// Stub engines
// ---------------------------------------------------------------------------

/// Returns a fixed result and records what it saw on disk.
struct FixedEngine {
    result: Value,
    calls: AtomicUsize,
    seen: Mutex<Vec<(PathBuf, Vec<u8>)>>,
}

impl FixedEngine {
    fn new(result: Value) -> Arc<Self> {
        Arc::new(Self {
            result,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisEngine for FixedEngine {
    async fn analyze(&self, path: &Path) -> Result<AnalysisResult, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AnalysisError::engine(e.to_string()))?;
        self.seen.lock().unwrap().push((path.to_path_buf(), bytes));
        Ok(AnalysisResult::new(self.result.clone()))
    }
}

/// Echoes the staged content back after a short pause.
struct EchoEngine;

#[async_trait]
impl AnalysisEngine for EchoEngine {
    async fn analyze(&self, path: &Path) -> Result<AnalysisResult, AnalysisError> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AnalysisError::engine(e.to_string()))?;
        Ok(AnalysisResult::new(json!({ "echo": text })))
    }
}

struct FailingEngine;

#[async_trait]
impl AnalysisEngine for FailingEngine {
    async fn analyze(&self, _path: &Path) -> Result<AnalysisResult, AnalysisError> {
        Err(AnalysisError::engine("pipeline crashed: no claims extracted"))
    }
}

struct PanickingEngine;

#[async_trait]
impl AnalysisEngine for PanickingEngine {
    async fn analyze(&self, _path: &Path) -> Result<AnalysisResult, AnalysisError> {
        panic!("model weights missing");
    }
}

struct SlowEngine;

#[async_trait]
impl AnalysisEngine for SlowEngine {
    async fn analyze(&self, _path: &Path) -> Result<AnalysisResult, AnalysisError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(AnalysisResult::new(json!({})))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct TestServer {
    base: String,
    client: reqwest::Client,
    shutdown: ShutdownSignal,
    task: JoinHandle<ServerResult<()>>,
    staging: TempDir,
}

impl TestServer {
    async fn start(engine: Arc<dyn AnalysisEngine>) -> Self {
        Self::start_with(AnalysisInvoker::new(engine), |gateway| gateway, |server| server).await
    }

    async fn start_with(
        invoker: AnalysisInvoker,
        configure_gateway: impl FnOnce(Gateway) -> Gateway,
        configure_server: impl FnOnce(Server) -> Server,
    ) -> Self {
        let staging = tempfile::tempdir().unwrap();
        let gateway = Gateway::new(invoker)
            .with_staging(StagingManager::new().with_dir(staging.path()));
        let server = configure_server(Server::new(configure_gateway(gateway)));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let shutdown = ShutdownSignal::new();
        let task = tokio::spawn(server.serve(listener, shutdown.clone()));

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            shutdown,
            task,
            staging,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn upload(&self, filename: &str, content: &[u8]) -> reqwest::Response {
        let part = Part::bytes(content.to_vec()).file_name(filename.to_string());
        let form = Form::new().part("file", part);
        self.client
            .post(self.url("/analyze"))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    fn staged_files(&self) -> usize {
        std::fs::read_dir(self.staging.path()).unwrap().count()
    }

    async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("server did not stop in time")
            .unwrap()
            .unwrap();
    }
}

async fn json_of(response: reqwest::Response) -> Value {
    response.json().await.unwrap()
}

// ---------------------------------------------------------------------------
// Informational endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_root_reports_name_and_version() {
    let server = TestServer::start(FixedEngine::new(json!({}))).await;

    let response = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        json_of(response).await,
        json!({"message": "Document Audit API", "version": docaudit_core::VERSION})
    );

    server.stop().await;
}

#[tokio::test]
async fn test_status_is_ok() {
    let server = TestServer::start(FixedEngine::new(json!({}))).await;

    let response = server.client.get(server.url("/status")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_of(response).await,
        json!({"status": "ok", "message": "Server is running"})
    );

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_path_and_wrong_method() {
    let server = TestServer::start(FixedEngine::new(json!({}))).await;

    let response = server.client.get(server.url("/nope")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_of(response).await, json!({"detail": "Not Found"}));

    let response = server.client.get(server.url("/analyze")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["allow"], "POST");
    assert_eq!(json_of(response).await, json!({"detail": "Method Not Allowed"}));

    server.stop().await;
}

// ---------------------------------------------------------------------------
// /analyze
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_mixed_case_pdf_is_analyzed_and_result_passed_through() {
    let result = json!({
        "claims": [{"text": "Revenue grew 12%", "verdict": "supported", "score": 0.91}],
        "summary": {"total": 1}
    });
    let engine = FixedEngine::new(result.clone());
    let server = TestServer::start(engine.clone()).await;

    let response = server.upload("report.PDF", b"%PDF-1.7 quarterly report").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_of(response).await, result);
    assert_eq!(engine.calls(), 1);

    let seen = engine.seen.lock().unwrap().clone();
    let (path, bytes) = &seen[0];
    assert!(path.to_string_lossy().ends_with(".pdf"));
    assert!(!path.to_string_lossy().contains("report"));
    assert_eq!(bytes, b"%PDF-1.7 quarterly report");
    assert_eq!(server.staged_files(), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_unsupported_extension_is_rejected_before_staging() {
    let engine = FixedEngine::new(json!({}));
    let server = TestServer::start(engine.clone()).await;

    let response = server.upload("notes.docx", b"PK\x03\x04").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_of(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains(".pdf, .txt"), "{detail}");
    assert_eq!(engine.calls(), 0);
    assert_eq!(server.staged_files(), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_empty_text_file_reaches_engine() {
    let engine = FixedEngine::new(json!({"claims": []}));
    let server = TestServer::start(engine.clone()).await;

    let response = server.upload("empty.txt", b"").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(engine.calls(), 1);
    let seen = engine.seen.lock().unwrap().clone();
    assert!(seen[0].1.is_empty());
    assert_eq!(server.staged_files(), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_unwritable_staging_is_500_without_path() {
    let missing = std::env::temp_dir().join(format!("docaudit-missing-{}", uuid::Uuid::now_v7()));
    let engine = FixedEngine::new(json!({}));
    let staging_dir = missing.clone();
    let server = TestServer::start_with(
        AnalysisInvoker::new(engine.clone()),
        move |gateway| gateway.with_staging(StagingManager::new().with_dir(staging_dir)),
        |server| server,
    )
    .await;

    let response = server.upload("report.pdf", b"%PDF").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_of(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Internal server error: "), "{detail}");
    assert!(!detail.contains(&*missing.to_string_lossy()), "{detail}");
    assert!(!detail.contains("docaudit-missing"), "{detail}");
    assert_eq!(engine.calls(), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_engine_failure_is_500_and_artifact_released() {
    let server = TestServer::start(Arc::new(FailingEngine)).await;

    let response = server.upload("notes.txt", b"some claims").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_of(response).await,
        json!({"detail": "Internal server error: pipeline crashed: no claims extracted"})
    );
    assert_eq!(server.staged_files(), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_engine_panic_is_500_and_artifact_released() {
    let server = TestServer::start(Arc::new(PanickingEngine)).await;

    let response = server.upload("notes.txt", b"some claims").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_of(response).await;
    assert_eq!(
        body["detail"],
        "Internal server error: analysis engine panicked: model weights missing"
    );
    assert_eq!(server.staged_files(), 0);

    // The server keeps serving after a panic.
    let response = server.client.get(server.url("/status")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    server.stop().await;
}

#[tokio::test]
async fn test_engine_timeout_is_500_and_artifact_released() {
    let invoker = AnalysisInvoker::new(Arc::new(SlowEngine)).with_timeout(Duration::from_millis(100));
    let server = TestServer::start_with(invoker, |gateway| gateway, |server| server).await;

    let response = server.upload("notes.txt", b"slow").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_of(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(
        detail.starts_with("Internal server error: analysis timed out"),
        "{detail}"
    );
    assert_eq!(server.staged_files(), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_request_deadline_releases_artifact() {
    let server = TestServer::start_with(
        AnalysisInvoker::new(Arc::new(SlowEngine)),
        |gateway| gateway,
        |server| server.with_request_timeout(Duration::from_millis(150)),
    )
    .await;

    let response = server.upload("notes.txt", b"slow").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_of(response).await,
        json!({"detail": "Internal server error: request timed out after 150ms"})
    );
    assert_eq!(server.staged_files(), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_oversized_upload_is_413() {
    let engine = FixedEngine::new(json!({}));
    let server = TestServer::start_with(
        AnalysisInvoker::new(engine.clone()),
        |gateway| gateway,
        |server| server.with_upload_limits(UploadLimits::new().max_body_bytes(1024)),
    )
    .await;

    let response = server.upload("big.txt", &[b'x'; 4096]).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        json_of(response).await,
        json!({"detail": "Payload too large: maximum upload size is 1024 bytes"})
    );
    assert_eq!(engine.calls(), 0);
    assert_eq!(server.staged_files(), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_missing_file_field_is_400() {
    let engine = FixedEngine::new(json!({}));
    let server = TestServer::start(engine.clone()).await;

    let form = Form::new().text("comment", "no document attached");
    let response = server
        .client
        .post(server.url("/analyze"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_of(response).await,
        json!({"detail": "Missing multipart field 'file'"})
    );
    assert_eq!(engine.calls(), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_json_body_is_400() {
    let server = TestServer::start(FixedEngine::new(json!({}))).await;

    let response = server
        .client
        .post(server.url("/analyze"))
        .json(&json!({"file": "report.pdf"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(server.staged_files(), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_uploads_are_isolated() {
    let server = Arc::new(TestServer::start(Arc::new(EchoEngine)).await);

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                let content = format!("document number {i}");
                let response = server.upload("doc.txt", content.as_bytes()).await;
                assert_eq!(response.status(), StatusCode::OK);
                let body = json_of(response).await;
                assert_eq!(body["echo"], content);
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(server.staged_files(), 0);

    let server = Arc::try_unwrap(server).ok().expect("tasks still hold the server");
    server.stop().await;
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let server = TestServer::start(FixedEngine::new(json!({}))).await;
    let url = server.url("/status");
    let client = server.client.clone();

    server.stop().await;

    assert!(client.get(url).send().await.is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_engine_end_to_end() {
    use docaudit_engine::CommandEngine;

    let script = r#"printf '{"bytes": %s}' "$(wc -c < "$0" | tr -d ' ')""#;
    let engine = CommandEngine::new("sh").with_args(["-c", script]);
    let server = TestServer::start(Arc::new(engine)).await;

    let response = server.upload("notes.txt", b"hello").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_of(response).await, json!({"bytes": 5}));
    assert_eq!(server.staged_files(), 0);

    server.stop().await;
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_engine_traceback_is_not_exposed() {
    use docaudit_engine::CommandEngine;

    let script = concat!(
        "echo 'Traceback (most recent call last):' >&2; ",
        r#"echo '  File "/opt/pipeline/__main__.py", line 12, in <module>' >&2; "#,
        r#"echo "    open(\"$0\").read()" >&2; "#,
        r#"echo "ValueError: could not parse $0" >&2; "#,
        "exit 1"
    );
    let engine = CommandEngine::new("sh").with_args(["-c", script]);
    let server = TestServer::start(Arc::new(engine)).await;

    let response = server.upload("report.pdf", b"%PDF-1.7").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_of(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert_eq!(
        detail,
        "Internal server error: ValueError: could not parse <document>"
    );
    assert!(!detail.contains(server.staging.path().to_str().unwrap()));
    assert_eq!(server.staged_files(), 0);

    server.stop().await;
}
