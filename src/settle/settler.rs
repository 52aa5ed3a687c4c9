//! Settlement engine.
//!
//! Settlements on one territory run inside a per-territory critical section
//! and write with a compare-and-swap on the snapshot version. The lock keeps
//! in-process settlements from interleaving; the version check catches
//! writers outside this process that share the store. A conflicting attempt
//! is redone from a fresh load, up to `max_settle_attempts` times.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::apply::{apply_reward, Settlement};
use super::SettleError;
use crate::clock::Clock;
use crate::config::ScoringConfig;
use crate::store::{StoreError, TerritoryStore};
use crate::territory::{Reward, TerritoryId};

/// Settles mission rewards against territories in a store.
pub struct Settler<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: Arc<ScoringConfig>,
    locks: Mutex<HashMap<TerritoryId, Arc<Mutex<()>>>>,
}

impl<S: TerritoryStore> Settler<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: Arc<ScoringConfig>) -> Self {
        Settler {
            store,
            clock,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Validates raw `(team, points)` requests and settles them.
    ///
    /// A malformed reward is rejected before the territory is even loaded.
    pub fn settle_requests<I, T>(&self, id: &TerritoryId, requests: I) -> Result<Settlement, SettleError>
    where
        I: IntoIterator<Item = (T, i64)>,
        T: AsRef<str>,
    {
        let reward = Reward::from_requests(requests)?;
        self.settle(id, &reward)
    }

    /// Applies `reward` to the territory and stores the new snapshot.
    pub fn settle(&self, id: &TerritoryId, reward: &Reward) -> Result<Settlement, SettleError> {
        let lock = self.territory_lock(id);
        let _guard = lock.lock();

        let attempts = self.config.max_settle_attempts.max(1);
        for attempt in 1..=attempts {
            let snapshot = self.store.load(id)?;
            // Never move a snapshot backwards if the clock lags the last write.
            let now = self.clock.now().max(snapshot.snapshot_time);
            let settlement = apply_reward(&snapshot, reward, now, &self.config);
            debug!(
                territory = %id,
                attempt,
                available_before = settlement.available_before,
                granted = settlement.total_granted(),
                "applying reward"
            );

            match self.store.save(&settlement.territory, Some(snapshot.version)) {
                Ok(()) => {
                    self.log_commit(&settlement);
                    return Ok(settlement);
                }
                Err(StoreError::VersionConflict {
                    expected, found, ..
                }) => {
                    warn!(territory = %id, attempt, expected, found, "settlement conflicted, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        warn!(territory = %id, attempts, "settlement gave up after repeated conflicts");
        Err(SettleError::Concurrency {
            id: id.clone(),
            attempts,
        })
    }

    /// Returns the lock guarding one territory, creating it on first use.
    fn territory_lock(&self, id: &TerritoryId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn log_commit(&self, settlement: &Settlement) {
        let territory = &settlement.territory;
        info!(
            territory = %territory.id,
            version = territory.version,
            granted = settlement.total_granted(),
            available = territory.available_points,
            "settlement committed"
        );
        if settlement.control_changed() {
            info!(
                territory = %territory.id,
                from = ?settlement.previous_controller.as_ref().map(|t| t.as_str()),
                to = ?territory.controlling_team.as_ref().map(|t| t.as_str()),
                "control changed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use crate::territory::{Category, Coordinates, Team, Territory};
    use chrono::{Duration, TimeZone, Utc};

    fn setup() -> (Arc<MemoryStore>, Arc<ManualClock>, Settler<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        ));
        store
            .insert(Territory::new(
                TerritoryId::new("t"),
                "Bärengraben",
                Category::Gastronomy,
                Coordinates::new(46.948, 7.459).unwrap(),
                240,
                clock.now(),
            ))
            .unwrap();
        let settler = Settler::new(
            store.clone(),
            clock.clone(),
            Arc::new(ScoringConfig::default()),
        );
        (store, clock, settler)
    }

    #[test]
    fn settle_writes_new_snapshot() {
        let (store, clock, settler) = setup();
        clock.advance(Duration::hours(1));
        let settlement = settler
            .settle_requests(&TerritoryId::new("t"), [("red", 50)])
            .unwrap();
        let stored = store.load(&TerritoryId::new("t")).unwrap();
        assert_eq!(stored, settlement.territory);
        assert_eq!(stored.available_points, 200);
        assert_eq!(stored.controlling_team, Some(Team::new("red").unwrap()));
        assert_eq!(stored.version, 1);
    }

    #[test]
    fn unknown_territory_is_not_found() {
        let (_, _, settler) = setup();
        let err = settler
            .settle_requests(&TerritoryId::new("nope"), [("red", 1)])
            .unwrap_err();
        assert!(matches!(err, SettleError::NotFound(id) if id.as_str() == "nope"));
    }

    #[test]
    fn malformed_reward_leaves_snapshot_untouched() {
        let (store, _, settler) = setup();
        let before = store.load(&TerritoryId::new("t")).unwrap();
        let err = settler
            .settle_requests(&TerritoryId::new("t"), [("red", 5), ("blue", -3)])
            .unwrap_err();
        assert!(matches!(err, SettleError::Validation(_)));
        assert_eq!(store.load(&TerritoryId::new("t")).unwrap(), before);
    }

    #[test]
    fn lagging_clock_does_not_rewind_snapshot() {
        let (store, clock, settler) = setup();
        let created = clock.now();
        clock.advance(Duration::hours(-2));
        let settlement = settler
            .settle_requests(&TerritoryId::new("t"), [("red", 1)])
            .unwrap();
        assert_eq!(settlement.territory.snapshot_time, created);
        assert_eq!(store.load(&TerritoryId::new("t")).unwrap().available_points, 239);
    }

    #[test]
    fn locks_are_per_territory() {
        let (_, _, settler) = setup();
        let a = settler.territory_lock(&TerritoryId::new("a"));
        let a_again = settler.territory_lock(&TerritoryId::new("a"));
        let b = settler.territory_lock(&TerritoryId::new("b"));
        assert!(Arc::ptr_eq(&a, &a_again));
        assert!(!Arc::ptr_eq(&a, &b));
        let _held = a.lock();
        assert!(b.try_lock().is_some());
    }
}
