use reqwest::StatusCode;

// Custom error type for resource retrieval operations
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlError(String),

    #[error("Upstream returned status code {0}")]
    StatusCode(StatusCode),

    #[error("Resource not found upstream: {0}")]
    NotFound(String),

    #[error("Offline and no cached copy available: {0}")]
    Unavailable(String),

    #[error("Archive error: {0}")]
    ArchiveError(#[from] rc_archive::ArchiveError),

    #[error("Payload rejected by validation: {}", reasons.join("; "))]
    Validation { reasons: Vec<String> },

    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ResourceError {
    /// True for failures worth retrying or bridging with a stale cache
    /// entry. A 404 is not among them: the resource does not exist.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            ResourceError::NotFound(_)
                | ResourceError::UnknownResource(_)
                | ResourceError::UrlError(_)
                | ResourceError::Validation { .. }
        )
    }
}
