//! Pure projections of a territory snapshot to an arbitrary time.
//!
//! Points decay exponentially and the available budget regenerates linearly
//! up to a ceiling. Nothing here mutates the snapshot, so calling any of
//! these twice with the same inputs gives the same answer.
//!
//! Rounding uses `f64::round` (half away from zero). All inputs are
//! non-negative, so this is the same as rounding half up.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::config::ScoringConfig;
use crate::territory::{Team, Territory};

/// Current points and budget of a territory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub points: BTreeMap<Team, u64>,
    pub available: u64,
}

/// Milliseconds between the snapshot and `now`, clamped at zero.
pub fn elapsed_ms(snapshot_time: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - snapshot_time).num_milliseconds().max(0)
}

/// Decays a stored point value over `elapsed_ms`.
pub fn decay(points: u64, elapsed_ms: i64, config: &ScoringConfig) -> u64 {
    if points == 0 || elapsed_ms <= 0 {
        return points;
    }
    let factor = config.retention_per_ms().powf(elapsed_ms as f64);
    (points as f64 * factor).round() as u64
}

/// Projects every team's points to `now`.
///
/// The result holds an entry for each configured team plus every team that
/// has stored points.
pub fn project_points(
    snapshot: &Territory,
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> BTreeMap<Team, u64> {
    let elapsed = elapsed_ms(snapshot.snapshot_time, now);
    let mut points: BTreeMap<Team, u64> =
        config.teams.iter().map(|team| (team.clone(), 0)).collect();
    for (team, &stored) in &snapshot.points_by_team {
        points.insert(team.clone(), decay(stored, elapsed, config));
    }
    points
}

/// Projects the available budget to `now`.
pub fn project_available_points(
    snapshot: &Territory,
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> u64 {
    let elapsed = elapsed_ms(snapshot.snapshot_time, now);
    let regenerated = snapshot.available_points as f64 + elapsed as f64 * config.regen_per_ms();
    regenerated.min(config.max_available as f64).round() as u64
}

/// When a person may next claim the visit bonus at a territory.
///
/// Without a previous bonus visit the bonus is available right away. A date
/// past the representable range saturates at `DateTime::<Utc>::MAX_UTC`.
pub fn next_visit_bonus_date(
    last_bonus_completion: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> DateTime<Utc> {
    match last_bonus_completion {
        Some(completed) => completed
            .checked_add_signed(config.visit_bonus_cooldown())
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
        None => now,
    }
}

/// Projects points and budget together.
pub fn project(snapshot: &Territory, now: DateTime<Utc>, config: &ScoringConfig) -> Projection {
    Projection {
        points: project_points(snapshot, now, config),
        available: project_available_points(snapshot, now, config),
    }
}
