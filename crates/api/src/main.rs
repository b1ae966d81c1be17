use std::net::SocketAddr;
use std::sync::Arc;

use deepguard_core::analysis::script::{ScriptAnalyzer, ScriptScanner};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deepguard_api::config::ServerConfig;
use deepguard_api::router::build_app_router;
use deepguard_api::scanning::launcher::ScanLauncher;
use deepguard_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deepguard_api=debug,deepguard_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database (optional) ---
    let pool = match config.database_url.as_deref() {
        Some(url) => {
            let pool = deepguard_db::create_pool(url).expect("Invalid DATABASE_URL");
            tracing::info!("Database connection pool created");
            Some(pool)
        }
        None => {
            tracing::info!("DATABASE_URL not set, running without a database");
            None
        }
    };

    // --- Uploads directory ---
    deepguard_core::uploads::ensure_upload_dir(&config.upload_dir)
        .await
        .expect("Failed to create uploads directory");
    tracing::info!(upload_dir = %config.upload_dir.display(), "Uploads directory ready");

    // --- External analysis processes ---
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
    tracing::info!(
        analyze_script = %config.analyze_script.display(),
        scan_script = %config.scan_script.display(),
        "External analyzers configured",
    );

    // --- Scan launcher (picks up a scan left running by a previous process) ---
    let scan_launcher = ScanLauncher::new(Arc::new(scanner), config.scan_run_path.clone());
    scan_launcher.restore().await;

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        analyzer: Arc::new(analyzer),
        scan_launcher: Arc::new(scan_launcher),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // Background scanners are not ours to stop; they finish on their own.
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
