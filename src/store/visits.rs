//! Visit-bonus history.
//!
//! Recording visits belongs to the mission layer; the ledger only asks when a
//! person last earned a visit bonus at a territory.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::territory::TerritoryId;

/// Opaque person identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        PersonId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lookup of past visit-bonus completions.
pub trait VisitLog: Send + Sync {
    /// Completion time of the most recent bonus-granting visit, if any.
    fn last_bonus_completion(
        &self,
        territory: &TerritoryId,
        person: &PersonId,
    ) -> Result<Option<DateTime<Utc>>, StoreError>;
}

/// In-memory visit log keeping the latest completion per (territory, person).
#[derive(Debug, Default)]
pub struct MemoryVisitLog {
    latest: RwLock<HashMap<(TerritoryId, PersonId), DateTime<Utc>>>,
}

impl MemoryVisitLog {
    pub fn new() -> Self {
        MemoryVisitLog::default()
    }

    /// Records a bonus visit. Older completions never replace newer ones.
    pub fn record_bonus(&self, territory: TerritoryId, person: PersonId, completed: DateTime<Utc>) {
        let mut latest = self.latest.write();
        let entry = latest.entry((territory, person)).or_insert(completed);
        if completed > *entry {
            *entry = completed;
        }
    }
}

impl VisitLog for MemoryVisitLog {
    fn last_bonus_completion(
        &self,
        territory: &TerritoryId,
        person: &PersonId,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self
            .latest
            .read()
            .get(&(territory.clone(), person.clone()))
            .copied())
    }
}
