/// Errors from talking to the DeepGuard API.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The HTTP request itself failed (connection refused, DNS, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("DeepGuard API error ({status}): {message}")]
    Api {
        status: u16,
        /// The `error` field of the JSON body, or the raw body.
        message: String,
    },
}
