use async_trait::async_trait;
use estate_core::{Estate, EstateId};
use estate_geo::{BoundingBox, Coordinate};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::{EstateRepository, StorageError};

/// Process-local estate table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<BTreeMap<EstateId, Estate>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_estates(estates: impl IntoIterator<Item = Estate>) -> Self {
        let store = Self::new();
        for estate in estates {
            store.insert(estate);
        }
        store
    }

    pub fn insert(&self, estate: Estate) {
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(estate.id, estate);
    }
}

#[async_trait]
impl EstateRepository for MemoryStore {
    async fn get(&self, id: EstateId) -> Result<Option<Estate>, StorageError> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        Ok(rows.get(&id).cloned())
    }

    async fn list_in_bounding_box(
        &self,
        bbox: &BoundingBox,
    ) -> Result<Vec<Estate>, StorageError> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        let mut estates: Vec<Estate> = rows
            .values()
            .filter(|estate| bbox.contains(Coordinate::new(estate.latitude, estate.longitude)))
            .cloned()
            .collect();
        estates.sort_by_key(|estate| (Reverse(estate.popularity), estate.id));
        Ok(estates)
    }
}
