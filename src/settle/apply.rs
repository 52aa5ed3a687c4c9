//! Applying a reward to a projected snapshot.
//!
//! This is the computational half of a settlement: it never touches storage,
//! so a failed write afterwards leaves nothing behind.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ScoringConfig;
use crate::ledger::project;
use crate::territory::{Reward, Team, Territory};

/// Points actually captured by one team in a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grant {
    pub team: Team,
    pub requested: u64,
    pub granted: u64,
}

/// Outcome of applying a reward.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    /// The snapshot to store.
    pub territory: Territory,
    /// One entry per reward request, in reward order.
    pub grants: Vec<Grant>,
    /// Projected budget before any grant.
    pub available_before: u64,
    pub previous_controller: Option<Team>,
}

impl Settlement {
    pub fn total_granted(&self) -> u64 {
        self.grants.iter().map(|g| g.granted).sum()
    }

    pub fn control_changed(&self) -> bool {
        self.previous_controller != self.territory.controlling_team
    }
}

/// Picks the controlling team after a settlement.
///
/// The incumbent's (already updated) points are the score to beat, and only
/// a strictly greater total takes over. Teams are scanned in lexicographic
/// order, so without an incumbent the first team holding the maximum wins.
pub fn determine_controller(points: &BTreeMap<Team, u64>, incumbent: Option<&Team>) -> Option<Team> {
    let mut best: Option<(&Team, u64)> =
        incumbent.map(|team| (team, points.get(team).copied().unwrap_or(0)));
    for (team, &p) in points {
        match best {
            Some((_, best_points)) if p <= best_points => {}
            _ => best = Some((team, p)),
        }
    }
    best.map(|(team, _)| team.clone())
}

/// Projects `snapshot` to `now` and applies `reward` against the budget.
///
/// Requests are granted first-come in reward order; once the budget runs
/// out later teams get less or nothing. The returned snapshot carries the
/// next version number.
pub fn apply_reward(
    snapshot: &Territory,
    reward: &Reward,
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> Settlement {
    let projection = project(snapshot, now, config);
    let mut points = projection.points;
    let mut available = projection.available;

    let mut grants = Vec::with_capacity(reward.len());
    for (team, requested) in reward.iter() {
        let granted = requested.min(available);
        let entry = points.entry(team.clone()).or_insert(0);
        *entry = entry.saturating_add(granted);
        available -= granted;
        grants.push(Grant {
            team: team.clone(),
            requested,
            granted,
        });
    }

    let controlling_team = determine_controller(&points, snapshot.controlling_team.as_ref());

    let territory = Territory {
        points_by_team: points,
        available_points: available,
        controlling_team,
        snapshot_time: now,
        version: snapshot.version + 1,
        ..snapshot.clone()
    };

    Settlement {
        territory,
        grants,
        available_before: projection.available,
        previous_controller: snapshot.controlling_team.clone(),
    }
}
