//! Load simulation.
//!
//! Creates a set of territories and, hour by simulated hour, fires batches
//! of mission completions at them from a rayon thread pool. Every settlement
//! is checked for budget conservation, so the simulation doubles as a
//! stress test of the per-territory locking.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::clock::{Clock, ManualClock};
use crate::config::ScoringConfig;
use crate::ledger::Ledger;
use crate::settle::Settler;
use crate::store::{MemoryStore, MemoryVisitLog, StoreError};
use crate::territory::{Category, Coordinates, Reward, RewardError, Team, TerritoryId};

/// Errors that abort a simulation run.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("generated an invalid reward: {0}")]
    Reward(#[from] RewardError),
}

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of territories to create.
    pub territories: usize,
    /// Simulated hours to run.
    pub hours: u32,
    /// Mission completions per simulated hour.
    pub missions_per_hour: usize,
    /// Upper bound of a single team's request.
    pub max_request: u64,
    /// Worker threads.
    pub threads: usize,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    /// Suppress per-hour progress logging.
    pub quiet: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            territories: 20,
            hours: 72,
            missions_per_hour: 200,
            max_request: 40,
            threads: 4,
            seed: 0,
            quiet: false,
        }
    }
}

/// Totals gathered over a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationReport {
    pub settlements: usize,
    pub failed: usize,
    pub points_requested: u64,
    pub points_granted: u64,
    /// Settlements where grants plus the remaining budget did not add up to
    /// the budget before settling. Always 0 unless something is broken.
    pub conservation_violations: usize,
    pub control_changes: usize,
    /// Territories held per team at the end.
    pub controlled: BTreeMap<Team, usize>,
    pub uncontrolled: usize,
    /// Projected points per team summed over all territories at the end.
    pub standings: BTreeMap<Team, u64>,
}

#[derive(Default)]
struct Counters {
    settlements: AtomicUsize,
    failed: AtomicUsize,
    requested: AtomicU64,
    granted: AtomicU64,
    violations: AtomicUsize,
    control_changes: AtomicUsize,
}

/// Runs a simulation and returns its totals.
pub fn run_simulation(
    sim: &SimulationConfig,
    scoring: ScoringConfig,
) -> Result<SimulationReport, SimulationError> {
    let mut rng = if sim.seed != 0 {
        SmallRng::seed_from_u64(sim.seed)
    } else {
        SmallRng::from_entropy()
    };

    let teams = scoring.teams.clone();
    let config = Arc::new(scoring);
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let ledger = Ledger::new(
        store.clone(),
        Arc::new(MemoryVisitLog::new()),
        clock.clone(),
        config.clone(),
    );
    let settler = Settler::new(store, clock.clone(), config);

    let mut ids = Vec::with_capacity(sim.territories);
    for i in 0..sim.territories {
        let category = if i % 2 == 0 {
            Category::Gastronomy
        } else {
            Category::Retail
        };
        let lat = 46.90 + rng.gen::<f64>() * 0.1;
        let lng = 7.40 + rng.gen::<f64>() * 0.1;
        let coordinates = Coordinates::new(lat, lng).unwrap_or(Coordinates { lat: 46.95, lng: 7.45 });
        let territory = ledger.create(
            TerritoryId::random(&mut rng),
            &format!("territory-{}", i + 1),
            category,
            coordinates,
        )?;
        ids.push(territory.id);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(sim.threads.max(1))
        .build()?;
    let counters = Counters::default();

    if !ids.is_empty() && !teams.is_empty() {
        for hour in 1..=sim.hours {
            if clock.advance(Duration::hours(1)).is_none() {
                warn!(hour, "simulated clock reached the end of the calendar, stopping");
                break;
            }
            let missions: Vec<(usize, u64)> = (0..sim.missions_per_hour)
                .map(|_| (rng.gen_range(0..ids.len()), rng.gen()))
                .collect();

            pool.install(|| {
                missions
                    .par_iter()
                    .try_for_each(|&(target, seed)| -> Result<(), SimulationError> {
                        let mut rng = SmallRng::seed_from_u64(seed);
                        let reward = random_reward(&teams, sim.max_request, &mut rng)?;
                        settle_one(&settler, &ids[target], &reward, &counters);
                        Ok(())
                    })
            })?;

            if !sim.quiet {
                info!(
                    hour,
                    now = %clock.now(),
                    settlements = counters.settlements.load(Ordering::Relaxed),
                    "simulated hour complete"
                );
            }
        }
    }

    let mut report = SimulationReport {
        settlements: counters.settlements.load(Ordering::Relaxed),
        failed: counters.failed.load(Ordering::Relaxed),
        points_requested: counters.requested.load(Ordering::Relaxed),
        points_granted: counters.granted.load(Ordering::Relaxed),
        conservation_violations: counters.violations.load(Ordering::Relaxed),
        control_changes: counters.control_changes.load(Ordering::Relaxed),
        ..SimulationReport::default()
    };

    for view in ledger.list(None)? {
        match view.controlling_team {
            Some(team) => *report.controlled.entry(team).or_insert(0) += 1,
            None => report.uncontrolled += 1,
        }
        for (team, points) in view.points_by_team {
            *report.standings.entry(team).or_insert(0) += points;
        }
    }

    Ok(report)
}

/// Picks a random non-empty subset of teams in random order, each asking for
/// up to `max_request` points.
fn random_reward<R: Rng>(
    teams: &[Team],
    max_request: u64,
    rng: &mut R,
) -> Result<Reward, RewardError> {
    let mut order = teams.to_vec();
    order.shuffle(rng);
    order.truncate(rng.gen_range(1..=teams.len()));
    let requests: Vec<(Team, i64)> = order
        .into_iter()
        .map(|team| {
            let points = rng.gen_range(0..=max_request);
            (team, i64::try_from(points).unwrap_or(i64::MAX))
        })
        .collect();
    Reward::from_requests(requests.iter().map(|(team, points)| (team.as_str(), *points)))
}

fn settle_one(
    settler: &Settler<MemoryStore>,
    id: &TerritoryId,
    reward: &Reward,
    counters: &Counters,
) {
    match settler.settle(id, reward) {
        Ok(settlement) => {
            let granted = settlement.total_granted();
            counters.settlements.fetch_add(1, Ordering::Relaxed);
            counters
                .requested
                .fetch_add(reward.total_requested(), Ordering::Relaxed);
            counters.granted.fetch_add(granted, Ordering::Relaxed);
            if granted + settlement.territory.available_points != settlement.available_before {
                counters.violations.fetch_add(1, Ordering::Relaxed);
            }
            if settlement.control_changed() {
                counters.control_changes.fetch_add(1, Ordering::Relaxed);
            }
        }
        Err(e) => {
            warn!(territory = %id, "settlement failed: {}", e);
            counters.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}
