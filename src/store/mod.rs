//! Persistence boundary.
//!
//! The ledger only talks to storage through `TerritoryStore` and `VisitLog`.
//! In-memory implementations are provided for the command-line front end,
//! the simulator and tests.

pub mod memory;
pub mod visits;

use thiserror::Error;

use crate::territory::{Territory, TerritoryId};

pub use memory::MemoryStore;
pub use visits::{MemoryVisitLog, PersonId, VisitLog};

/// Errors reported by a storage backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("territory '{0}' not found")]
    NotFound(TerritoryId),

    #[error("territory '{0}' already exists")]
    AlreadyExists(TerritoryId),

    #[error("territory '{id}' changed concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        id: TerritoryId,
        expected: u64,
        found: u64,
    },

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Storage for territory snapshots.
pub trait TerritoryStore: Send + Sync {
    /// Loads the current snapshot of a territory.
    fn load(&self, id: &TerritoryId) -> Result<Territory, StoreError>;

    /// Replaces a stored snapshot.
    ///
    /// With `expected_version`, the write only succeeds if the stored
    /// snapshot still carries that version; otherwise `VersionConflict` is
    /// returned and nothing is written.
    fn save(&self, territory: &Territory, expected_version: Option<u64>) -> Result<(), StoreError>;

    /// Stores a new territory.
    fn insert(&self, territory: Territory) -> Result<(), StoreError>;

    /// Returns every stored snapshot, in no particular order.
    fn all(&self) -> Result<Vec<Territory>, StoreError>;
}
