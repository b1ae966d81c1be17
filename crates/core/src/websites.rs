//! Static website list provider.
//!
//! The list is a plain text file with one site identifier per line. It is
//! re-read on every call; there is no caching.

use std::path::Path;

use crate::error::CoreError;

/// Parse line-delimited site identifiers, trimming each line and dropping
/// blank ones. Order is preserved.
pub fn parse_website_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and parse the website list at `path`.
pub async fn read_website_list(path: &Path) -> Result<Vec<String>, CoreError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CoreError::StorageRead {
            what: "websites list",
            path: path.to_path_buf(),
            source,
        })?;

    Ok(parse_website_list(&contents))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
