use thiserror::Error;

/// Failures of the collection fetch workflow.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP 429. `retry_after` is the server's `Retry-After` value in seconds.
    #[error("rate limited by Discogs (retry after: {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    /// Any other non-2xx status. Never retried.
    #[error("Request failed: {status} {status_text}")]
    RequestFailed { status: u16, status_text: String },

    #[error("Failed after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },

    #[error("No collection folders found.")]
    NoFolders,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected startup configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Discogs {0} is missing")]
    Missing(&'static str),

    #[error("Discogs {0} is still the placeholder value, set your real one")]
    Placeholder(&'static str),

    #[error("API base URL cannot carry a path: {0}")]
    InvalidApiBase(String),
}
