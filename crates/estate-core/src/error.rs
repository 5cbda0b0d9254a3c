use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    Unavailable,
    Internal,
}

#[derive(Debug, Clone)]
pub struct EstateError {
    pub code: ErrorCode,
    pub message: String,
}

impl EstateError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for EstateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for EstateError {}

pub type EstateResult<T> = Result<T, EstateError>;
