//! End-to-end overlay tests against the real API router on a loopback port.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use tempfile::TempDir;

use deepguard_api::config::ServerConfig;
use deepguard_api::router::build_app_router;
use deepguard_api::scanning::launcher::ScanLauncher;
use deepguard_api::state::AppState;
use deepguard_core::analysis::script::{ScriptAnalyzer, ScriptScanner};
use deepguard_core::merge::SiteStatus;
use deepguard_watch::client::HttpScanApi;
use deepguard_watch::session::{OverlaySession, SessionState};

fn server_config(root: &Path) -> ServerConfig {
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

/// Serve the API over `dir` and return its base URL.
async fn spawn_server(dir: &TempDir) -> String {
    let config = server_config(dir.path());
    std::fs::write(&config.scan_script, "exit 0\n").expect("write scan script");

    let analyzer = ScriptAnalyzer::new(
        config.python_bin.clone(),
        config.analyze_script.clone(),
        config.analyze_timeout(),
    );
    let scanner = ScriptScanner::new(
        config.python_bin.clone(),
        config.scan_script.clone(),
        config.websites_file.clone(),
        config.scan_results_path.clone(),
    );
    let state = AppState {
        pool: None,
        config: Arc::new(config.clone()),
        analyzer: Arc::new(analyzer),
        scan_launcher: Arc::new(ScanLauncher::new(
            Arc::new(scanner),
            config.scan_run_path.clone(),
        )),
    };
    let app = build_app_router(state, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    format!("http://{addr}")
}

fn session_for(base_url: String) -> OverlaySession<HttpScanApi> {
    OverlaySession::new(Arc::new(HttpScanApi::new(base_url)), Duration::from_millis(50))
}

#[tokio::test]
async fn overlay_loads_sites_and_merges_polled_results() {
    let dir = tempfile::tempdir().expect("create temp dir");
    std::fs::write(dir.path().join("websites.txt"), "a.com\nb.com\nc.com\n").expect("write websites");
    std::fs::write(
        dir.path().join("scan_results.json"),
        r#"{
            "summary": {"total_scanned": 2, "deepfakes_found": 1},
            "all_results": [
                {"source_url": "https://a.com/", "prediction": "Real", "confidence": 70.0},
                {"source_url": "https://a.com/", "prediction": "Fake", "confidence": 93.0},
                {"source_url": "http://www.b.com", "prediction": "Real", "confidence": 88.0}
            ]
        }"#,
    )
    .expect("write results");

    let base_url = spawn_server(&dir).await;
    let mut session = session_for(base_url);

    assert_matches!(session.open().await, SessionState::Ready(_));
    session.spawn_poll();
    while session.apply_next().await {}

    let ready = session.ready().expect("ready");
    assert!(ready.scan_started());
    let statuses: Vec<_> = ready.site_statuses().collect();
    assert_eq!(
        statuses,
        vec![
            ("a.com", SiteStatus::Threat),
            ("b.com", SiteStatus::Safe),
            ("c.com", SiteStatus::Scanning),
        ]
    );
    assert!((ready.progress_percent() - 200.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn overlay_enters_error_when_list_is_unreadable() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let base_url = spawn_server(&dir).await;
    let mut session = session_for(base_url);

    assert_matches!(
        session.open().await,
        SessionState::Error(message) if message.contains("Failed to read websites list")
    );
}

#[tokio::test]
async fn overlay_enters_error_when_server_is_down() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let mut session = session_for(format!("http://{addr}"));
    assert_matches!(session.open().await, SessionState::Error(_));
}
