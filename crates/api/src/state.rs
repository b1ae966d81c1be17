use std::sync::Arc;

use deepguard_core::analysis::executor::MediaAnalyzer;

use crate::config::ServerConfig;
use crate::scanning::launcher::ScanLauncher;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, present only when `DATABASE_URL` is set.
    pub pool: Option<deepguard_db::DbPool>,
    /// Server configuration (file locations, upload policy).
    pub config: Arc<ServerConfig>,
    /// Single-image classifier.
    pub analyzer: Arc<dyn MediaAnalyzer>,
    /// Background scan launcher and latest-run record.
    pub scan_launcher: Arc<ScanLauncher>,
}
