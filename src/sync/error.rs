use crate::mt::MtError;
use crate::store::StoreError;

/// Error raised while reconciling one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    Store(StoreError),
    Translate(MtError),
}

impl SyncError {
    /// Fatal errors abort the whole pass; anything else only costs the
    /// current node and is picked up again on the next pass.
    pub fn is_fatal(&self) -> bool {
        match self {
            SyncError::Translate(err) => err.is_parse_error(),
            SyncError::Store(_) => false,
        }
    }
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Store(err) => write!(f, "Document store: {}", err),
            SyncError::Translate(err) => write!(f, "Translator: {}", err),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Store(err) => Some(err),
            SyncError::Translate(err) => Some(err),
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        SyncError::Store(err)
    }
}

impl From<MtError> for SyncError {
    fn from(err: MtError) -> Self {
        SyncError::Translate(err)
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
