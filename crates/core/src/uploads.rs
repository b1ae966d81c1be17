//! Local storage for uploaded images.
//!
//! Files are written to a flat directory under a name prefixed with the
//! upload timestamp in milliseconds. There is no content addressing or
//! deduplication.

use std::path::{Path, PathBuf};

use crate::error::CoreError;

/// Name used when the client sends no usable file name.
const FALLBACK_FILE_NAME: &str = "upload";

/// Reduce a client-supplied file name to a safe single path component.
///
/// Directory parts are dropped and anything outside `[A-Za-z0-9._-]` is
/// replaced with `_`. Leading dots are removed so the result is never
/// hidden or a relative path segment.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Stored name for an upload received at `timestamp_millis`.
pub fn stored_file_name(timestamp_millis: i64, original: &str) -> String {
    format!("{timestamp_millis}-{}", sanitize_file_name(original))
}

/// Create the uploads directory if it does not exist yet.
pub async fn ensure_upload_dir(dir: &Path) -> Result<(), CoreError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| CoreError::StorageWrite {
            what: "uploads directory",
            path: dir.to_path_buf(),
            source,
        })
}

/// Write an upload into `dir` and return its full path.
pub async fn persist_upload(
    dir: &Path,
    original_name: &str,
    bytes: &[u8],
) -> Result<PathBuf, CoreError> {
    ensure_upload_dir(dir).await?;

    let stamp = chrono::Utc::now().timestamp_millis();
    let path = dir.join(stored_file_name(stamp, original_name));

    tokio::fs::write(&path, bytes)
        .await
        .map_err(|source| CoreError::StorageWrite {
            what: "uploaded file",
            path: path.clone(),
            source,
        })?;

    tracing::debug!(stored_path = %path.display(), size = bytes.len(), "Stored upload");
    Ok(path)
}

/// Best-effort removal of a stored upload.
pub async fn remove_upload(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(stored_path = %path.display(), error = %e, "Failed to remove upload");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_plain_names() {
        assert_eq!(sanitize_file_name("face_01.jpg"), "face_01.jpg");
    }

    #[test]
    fn strips_directories_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\my pic.png"), "my_pic.png");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
    }

    #[test]
    fn empty_names_fall_back() {
        assert_eq!(sanitize_file_name(""), "upload");
        assert_eq!(sanitize_file_name("dir/"), "upload");
        assert_eq!(sanitize_file_name(".."), "upload");
    }

    #[test]
    fn stored_name_is_timestamp_prefixed() {
        assert_eq!(stored_file_name(1_700_000_000_123, "a.jpg"), "1700000000123-a.jpg");
    }

    #[tokio::test]
    async fn persist_creates_directory_and_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let uploads = dir.path().join("uploads");

        let path = persist_upload(&uploads, "img.png", b"\x89PNG")
            .await
            .expect("persist");

        assert!(path.starts_with(&uploads));
        let name = path.file_name().and_then(|n| n.to_str()).expect("file name");
        assert!(name.ends_with("-img.png"), "unexpected name {name}");
        assert_eq!(tokio::fs::read(&path).await.expect("read back"), b"\x89PNG");

        remove_upload(&path).await;
        assert!(!path.exists());
    }
}
