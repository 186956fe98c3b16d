use thiserror::Error;

/// Core error type shared across mockweave crates.
#[derive(Debug, Error)]
pub enum Error {
    /// JSON decoding failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results returned by mockweave crates.
pub type Result<T> = std::result::Result<T, Error>;
