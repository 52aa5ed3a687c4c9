//! Read path: creating territories and serving projected views.
//!
//! Reads never take the per-territory settlement lock. A view may therefore
//! reflect a snapshot that a concurrent settlement is about to replace.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info};

use super::projection::next_visit_bonus_date;
use super::view::TerritoryView;
use crate::clock::Clock;
use crate::config::ScoringConfig;
use crate::store::{PersonId, StoreError, TerritoryStore, VisitLog};
use crate::territory::{Category, Coordinates, Territory, TerritoryId};

/// Territory ledger backed by a store and a visit log.
pub struct Ledger<S, V> {
    store: Arc<S>,
    visits: Arc<V>,
    clock: Arc<dyn Clock>,
    config: Arc<ScoringConfig>,
}

impl<S: TerritoryStore, V: VisitLog> Ledger<S, V> {
    pub fn new(
        store: Arc<S>,
        visits: Arc<V>,
        clock: Arc<dyn Clock>,
        config: Arc<ScoringConfig>,
    ) -> Self {
        Ledger {
            store,
            visits,
            clock,
            config,
        }
    }

    /// Creates a territory with an empty score and one day of budget.
    pub fn create(
        &self,
        id: TerritoryId,
        name: &str,
        category: Category,
        coordinates: Coordinates,
    ) -> Result<Territory, StoreError> {
        let territory = Territory::new(
            id,
            name,
            category,
            coordinates,
            self.config.initial_available(),
            self.clock.now(),
        );
        self.store.insert(territory.clone())?;
        info!(territory = %territory.id, name, category = category.name(), "territory created");
        Ok(territory)
    }

    /// Projects a single territory to now. With a person, the view also
    /// carries when that person may next claim the visit bonus.
    pub fn view(
        &self,
        id: &TerritoryId,
        person: Option<&PersonId>,
    ) -> Result<TerritoryView, StoreError> {
        let snapshot = self.store.load(id)?;
        let now = self.clock.now();
        self.project_view(&snapshot, now, person)
    }

    /// Projects every territory to the same instant, ordered by id.
    pub fn list(&self, person: Option<&PersonId>) -> Result<Vec<TerritoryView>, StoreError> {
        let mut snapshots = self.store.all()?;
        snapshots.sort_by(|a, b| a.id.cmp(&b.id));
        let now = self.clock.now();
        debug!(count = snapshots.len(), %now, "projecting territory list");
        snapshots
            .par_iter()
            .map(|snapshot| self.project_view(snapshot, now, person))
            .collect()
    }

    /// Fails with `NotFound` unless `id` is stored.
    pub fn ensure_exists(&self, id: &TerritoryId) -> Result<(), StoreError> {
        self.store.load(id).map(|_| ())
    }

    /// When `person` may next claim the visit bonus at `id`.
    pub fn next_visit_bonus_date(
        &self,
        id: &TerritoryId,
        person: &PersonId,
    ) -> Result<DateTime<Utc>, StoreError> {
        self.ensure_exists(id)?;
        let last = self.visits.last_bonus_completion(id, person)?;
        Ok(next_visit_bonus_date(last, self.clock.now(), &self.config))
    }

    fn project_view(
        &self,
        snapshot: &Territory,
        now: DateTime<Utc>,
        person: Option<&PersonId>,
    ) -> Result<TerritoryView, StoreError> {
        let bonus_date = match person {
            Some(person) => {
                let last = self.visits.last_bonus_completion(&snapshot.id, person)?;
                Some(next_visit_bonus_date(last, now, &self.config))
            }
            None => None,
        };
        Ok(TerritoryView::project(snapshot, now, &self.config, bonus_date))
    }
}
