use thiserror::Error;

/// Failures talking to the catalog service. Surfaced to the caller as-is;
/// nothing in the crate retries on its own.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{url} -> {status}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    #[error("JSON parse failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("page numbers start at 1")]
    InvalidPage,
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored favorites are unreadable: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("favorites could not be serialized: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("stored favorites use unsupported version {0}")]
    UnsupportedVersion(u32),
}

impl StorageError {
    /// True when the stored blob exists but cannot be understood.
    pub fn is_unreadable(&self) -> bool {
        matches!(
            self,
            StorageError::Parse(_) | StorageError::UnsupportedVersion(_)
        )
    }
}
