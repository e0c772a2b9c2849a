/// Error types for the Machine Translation module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MtError {
    /// Provider could not be configured (missing key, bad client setup)
    ConfigError(String),
    /// Locale code rejected before any request was made
    InvalidLocale(String),
    /// Request never produced a response
    NetworkError(String),
    /// Non-success HTTP status with whatever message the API reported
    ApiError { status: u16, message: String },
    /// Response body did not have the expected shape
    ParseError(String),
    /// Error during translation phase
    TranslationError(String),
}

impl std::fmt::Display for MtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MtError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            MtError::InvalidLocale(msg) => write!(f, "Invalid locale: {}", msg),
            MtError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            MtError::ApiError { status, message } => {
                write!(f, "API error (HTTP {}): {}", status, message)
            }
            MtError::ParseError(msg) => write!(f, "Unparsable translation response: {}", msg),
            MtError::TranslationError(msg) => write!(f, "Translation error: {}", msg),
        }
    }
}

impl std::error::Error for MtError {}

impl From<reqwest::Error> for MtError {
    fn from(err: reqwest::Error) -> Self {
        MtError::NetworkError(err.to_string())
    }
}

impl MtError {
    /// A response that cannot be read at all; the current pass must not continue
    /// as if the node had been handled.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, MtError::ParseError(_))
    }
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;
