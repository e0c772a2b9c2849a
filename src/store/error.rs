/// Error types for document store operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store client could not be configured
    ConfigError(String),
    /// Request never produced a response
    NetworkError(String),
    /// Non-success HTTP status with the store's structured error body
    ApiError {
        status: u16,
        code: String,
        message: String,
    },
    /// Response body did not have the expected shape
    ParseError(String),
    /// Node id unknown to the store
    NotFound(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            StoreError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            StoreError::ApiError {
                status,
                code,
                message,
            } => write!(f, "HTTP {} ({}): {}", status, code, message),
            StoreError::ParseError(msg) => write!(f, "Unexpected store response: {}", msg),
            StoreError::NotFound(id) => write!(f, "Node not found: {}", id),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::ParseError(err.to_string())
    }
}

/// Result type for document store operations
pub type StoreResult<T> = Result<T, StoreError>;
