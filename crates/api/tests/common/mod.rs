#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use deepguard_api::config::ServerConfig;
use deepguard_api::router::build_app_router;
use deepguard_api::scanning::launcher::ScanLauncher;
use deepguard_api::state::AppState;
use deepguard_core::analysis::executor::{AnalysisError, MediaAnalyzer};
use deepguard_core::analysis::script::ScriptScanner;
use deepguard_core::verdict::{parse_analysis_output, Verdict};

pub const MULTIPART_BOUNDARY: &str = "deepguard-test-boundary";

/// Build a test `ServerConfig` whose files all live under `root`.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config(root: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: None,
        websites_file: root.join("websites.txt"),
        scan_results_path: root.join("scan_results.json"),
        scan_run_path: root.join("scan_run.json"),
        upload_dir: root.join("uploads"),
        delete_uploads: false,
        max_upload_bytes: 1024 * 1024,
        python_bin: "bash".to_string(),
        analyze_script: root.join("predict.sh"),
        scan_script: root.join("scan.sh"),
        analyze_timeout_secs: 5,
    }
}

/// Analyzer double that parses a canned stdout and records every path it
/// was asked to analyze.
pub struct CannedAnalyzer {
    stdout: String,
    pub calls: AtomicUsize,
    pub seen_paths: Mutex<Vec<PathBuf>>,
}

impl CannedAnalyzer {
    pub fn new(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            calls: AtomicUsize::new(0),
            seen_paths: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MediaAnalyzer for CannedAnalyzer {
    async fn analyze(&self, path: &Path) -> Result<Verdict, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_paths
            .lock()
            .expect("seen_paths lock")
            .push(path.to_path_buf());
        Ok(parse_analysis_output(&self.stdout)?)
    }
}

/// A temporary working directory plus the app built over it.
pub struct TestApp {
    pub dir: TempDir,
    pub config: ServerConfig,
    pub app: Router,
}

/// Build the full application router over a fresh temp directory.
///
/// The analyzer is the given double; the scanner runs `scan.sh` (written
/// by the caller when needed) with `bash`.
pub fn build_test_app_with(
    analyzer: Arc<dyn MediaAnalyzer>,
    configure: impl FnOnce(&mut ServerConfig),
) -> TestApp {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut config = test_config(dir.path());
    configure(&mut config);

    let scanner = ScriptScanner::new(
        config.python_bin.clone(),
        config.scan_script.clone(),
        config.websites_file.clone(),
        config.scan_results_path.clone(),
    );

    let state = AppState {
        pool: None,
        config: Arc::new(config.clone()),
        analyzer,
        scan_launcher: Arc::new(ScanLauncher::new(
            Arc::new(scanner),
            config.scan_run_path.clone(),
        )),
    };

    let app = build_app_router(state, &config);
    TestApp { dir, config, app }
}

/// Build the app with an analyzer that reports a confident `Real`.
pub fn build_test_app() -> TestApp {
    build_test_app_with(
        Arc::new(CannedAnalyzer::new("[Result] Class: Real\n[Confidence] 97.5%\n")),
        |_| {},
    )
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    app.oneshot(request).await.expect("oneshot")
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    app.oneshot(request).await.expect("oneshot")
}

/// Encode a single file field as a multipart/form-data body.
pub fn multipart_body(field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

/// Encode a single plain-text field (no filename) as a multipart body.
pub fn multipart_text_body(field: &str, value: &str) -> Vec<u8> {
    format!(
        "--{MULTIPART_BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"\r\n\r\n\
         {value}\r\n--{MULTIPART_BOUNDARY}--\r\n"
    )
    .into_bytes()
}

pub async fn post_multipart(app: Router, uri: &str, body: Vec<u8>) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("build request");
    app.oneshot(request).await.expect("oneshot")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}
