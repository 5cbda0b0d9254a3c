use estate_core::{ErrorCode, EstateError, EstateId};
use estate_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("estate {0} not found")]
    NotFound(EstateId),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SearchError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Storage(_) => ErrorCode::Internal,
        }
    }
}

impl From<SearchError> for EstateError {
    fn from(err: SearchError) -> Self {
        EstateError::new(err.code(), err.to_string())
    }
}
