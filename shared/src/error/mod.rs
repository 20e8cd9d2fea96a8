use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Malformed webhook request: {0}")]
    Parse(String),

    #[error("Invite code not found: {0}")]
    NotFound(String),

    #[error("Malformed directory row: {0}")]
    Lookup(String),

    #[error("Missing or invalid slot value: {0}")]
    Extraction(String),

    #[error("Row store write failed: {0}")]
    StoreWrite(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Request timed out: {0}")]
    Timeout(String),
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Parse(format!("JSON serialization error: {}", err))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Internal(format!("HTTP transport error: {}", err))
    }
}
