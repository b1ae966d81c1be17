use std::path::PathBuf;
use std::time::Duration;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`). Must exceed the
    /// analyzer timeout or analyze requests are cut off by the middleware.
    pub request_timeout_secs: u64,
    /// Optional Postgres URL, used only for health reporting.
    pub database_url: Option<String>,
    /// Line-delimited list of sites to scan.
    pub websites_file: PathBuf,
    /// Results document written by the scanner.
    pub scan_results_path: PathBuf,
    /// Record of the latest scan launch, kept across restarts.
    pub scan_run_path: PathBuf,
    /// Directory that receives uploaded images.
    pub upload_dir: PathBuf,
    /// Remove each upload once its analysis finishes (default: `false`).
    pub delete_uploads: bool,
    /// Maximum accepted request body for uploads, in bytes.
    pub max_upload_bytes: usize,
    /// Interpreter used for both analysis scripts.
    pub python_bin: String,
    pub analyze_script: PathBuf,
    pub scan_script: PathBuf,
    /// Analyzer timeout in seconds; `0` waits indefinitely.
    pub analyze_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                          |
    /// |------------------------|----------------------------------|
    /// | `HOST`                 | `0.0.0.0`                        |
    /// | `PORT`                 | `5000`                           |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`          |
    /// | `REQUEST_TIMEOUT_SECS` | `300`                            |
    /// | `DATABASE_URL`         | unset                            |
    /// | `WEBSITES_FILE`        | `websites.txt`                   |
    /// | `SCAN_RESULTS_PATH`    | `ml_service/scan_results.json`   |
    /// | `SCAN_RUN_PATH`        | `ml_service/scan_run.json`       |
    /// | `UPLOAD_DIR`           | `uploads`                        |
    /// | `DELETE_UPLOADS`       | `false`                          |
    /// | `MAX_UPLOAD_BYTES`     | `26214400`                       |
    /// | `PYTHON_BIN`           | `python3`                        |
    /// | `ANALYZE_SCRIPT`       | `ml_service/predict.py`          |
    /// | `SCAN_SCRIPT`          | `ml_service/deepfake_scanner.py` |
    /// | `ANALYZE_TIMEOUT_SECS` | `120`                            |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let delete_uploads = std::env::var("DELETE_UPLOADS")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (25 * 1024 * 1024).to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let analyze_timeout_secs: u64 = std::env::var("ANALYZE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("ANALYZE_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            websites_file: path_var("WEBSITES_FILE", "websites.txt"),
            scan_results_path: path_var("SCAN_RESULTS_PATH", "ml_service/scan_results.json"),
            scan_run_path: path_var("SCAN_RUN_PATH", "ml_service/scan_run.json"),
            upload_dir: path_var("UPLOAD_DIR", "uploads"),
            delete_uploads,
            max_upload_bytes,
            python_bin: std::env::var("PYTHON_BIN").unwrap_or_else(|_| "python3".into()),
            analyze_script: path_var("ANALYZE_SCRIPT", "ml_service/predict.py"),
            scan_script: path_var("SCAN_SCRIPT", "ml_service/deepfake_scanner.py"),
            analyze_timeout_secs,
        }
    }

    /// Analyzer timeout, or `None` when disabled.
    pub fn analyze_timeout(&self) -> Option<Duration> {
        (self.analyze_timeout_secs > 0).then(|| Duration::from_secs(self.analyze_timeout_secs))
    }
}

fn path_var(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}
