use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Failed to read {what} at {}: {source}", path.display())]
    StorageRead {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {what} at {}: {source}", path.display())]
    StorageWrite {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
