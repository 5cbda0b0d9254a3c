pub mod memory;

use async_trait::async_trait;
use estate_core::{Estate, EstateId};
use estate_geo::BoundingBox;
use std::fmt;

pub use memory::MemoryStore;

#[derive(Debug, Clone)]
pub struct StorageError {
    pub message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StorageError {}

#[async_trait]
pub trait EstateRepository: Send + Sync {
    async fn get(&self, id: EstateId) -> Result<Option<Estate>, StorageError>;

    /// Every estate whose location falls inside `bbox` (edges inclusive),
    /// ordered by popularity descending, then id ascending.
    async fn list_in_bounding_box(&self, bbox: &BoundingBox)
    -> Result<Vec<Estate>, StorageError>;
}
