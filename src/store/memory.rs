//! In-memory territory store.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{StoreError, TerritoryStore};
use crate::territory::{Territory, TerritoryId};

/// A `TerritoryStore` backed by a map behind a read-write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    territories: RwLock<HashMap<TerritoryId, Territory>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.territories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.territories.read().is_empty()
    }
}

impl TerritoryStore for MemoryStore {
    fn load(&self, id: &TerritoryId) -> Result<Territory, StoreError> {
        self.territories
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn save(&self, territory: &Territory, expected_version: Option<u64>) -> Result<(), StoreError> {
        let mut territories = self.territories.write();
        let stored = territories
            .get_mut(&territory.id)
            .ok_or_else(|| StoreError::NotFound(territory.id.clone()))?;
        if let Some(expected) = expected_version {
            if stored.version != expected {
                return Err(StoreError::VersionConflict {
                    id: territory.id.clone(),
                    expected,
                    found: stored.version,
                });
            }
        }
        *stored = territory.clone();
        Ok(())
    }

    fn insert(&self, territory: Territory) -> Result<(), StoreError> {
        let mut territories = self.territories.write();
        if territories.contains_key(&territory.id) {
            return Err(StoreError::AlreadyExists(territory.id));
        }
        territories.insert(territory.id.clone(), territory);
        Ok(())
    }

    fn all(&self) -> Result<Vec<Territory>, StoreError> {
        Ok(self.territories.read().values().cloned().collect())
    }
}
