//! Scoring configuration.
//!
//! All rates are stored in human units (per day, per hour) and converted to
//! per-millisecond factors on demand. Configuration can be loaded from a JSON
//! file; missing fields fall back to the defaults below.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::territory::Team;

/// Milliseconds in one hour.
pub const MS_PER_HOUR: f64 = 60.0 * 60.0 * 1000.0;

/// Milliseconds in one day.
pub const MS_PER_DAY: f64 = 24.0 * MS_PER_HOUR;

/// Longest accepted visit-bonus cooldown (ten years).
pub const MAX_VISIT_BONUS_COOLDOWN_DAYS: u32 = 3650;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("decay_per_day must be in [0, 1), got {0}")]
    DecayOutOfRange(f64),

    #[error("regen_per_hour must be finite and non-negative, got {0}")]
    InvalidRegen(f64),

    #[error("visit_bonus_cooldown_days must be at most {max}, got {0}", max = MAX_VISIT_BONUS_COOLDOWN_DAYS)]
    CooldownTooLong(u32),

    #[error("max_settle_attempts must be at least 1")]
    ZeroAttempts,

    #[error("team '{0}' is listed more than once")]
    DuplicateTeam(Team),
}

/// Tunable constants of the scoring model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Fraction of a team's points lost per day.
    pub decay_per_day: f64,
    /// Points added to a territory's budget per hour.
    pub regen_per_hour: f64,
    /// Ceiling of a territory's budget.
    pub max_available: u64,
    /// Wait between two visit bonuses for the same person and territory.
    pub visit_bonus_cooldown_days: u32,
    /// Teams that always appear in projected points.
    pub teams: Vec<Team>,
    /// Settlement attempts before giving up on version conflicts.
    pub max_settle_attempts: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let teams = ["blue", "green", "red"]
            .iter()
            .filter_map(|name| Team::new(name).ok())
            .collect();
        ScoringConfig {
            decay_per_day: 0.10,
            regen_per_hour: 10.0,
            max_available: 500,
            visit_bonus_cooldown_days: 21,
            teams,
            max_settle_attempts: 3,
        }
    }
}

impl ScoringConfig {
    /// Fraction of points retained per elapsed millisecond.
    pub fn retention_per_ms(&self) -> f64 {
        (1.0 - self.decay_per_day).powf(1.0 / MS_PER_DAY)
    }

    /// Budget regenerated per elapsed millisecond.
    pub fn regen_per_ms(&self) -> f64 {
        self.regen_per_hour / MS_PER_HOUR
    }

    /// Budget of a newly created territory: one day of regeneration.
    pub fn initial_available(&self) -> u64 {
        let day = (self.regen_per_hour * 24.0).round() as u64;
        day.min(self.max_available)
    }

    pub fn visit_bonus_cooldown(&self) -> Duration {
        Duration::days(i64::from(self.visit_bonus_cooldown_days))
    }

    /// Checks that every value is usable by the projection math.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.decay_per_day) {
            return Err(ConfigError::DecayOutOfRange(self.decay_per_day));
        }
        if !self.regen_per_hour.is_finite() || self.regen_per_hour < 0.0 {
            return Err(ConfigError::InvalidRegen(self.regen_per_hour));
        }
        if self.visit_bonus_cooldown_days > MAX_VISIT_BONUS_COOLDOWN_DAYS {
            return Err(ConfigError::CooldownTooLong(self.visit_bonus_cooldown_days));
        }
        if self.max_settle_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        let mut seen = HashSet::new();
        for team in &self.teams {
            if !seen.insert(team) {
                return Err(ConfigError::DuplicateTeam(team.clone()));
            }
        }
        Ok(())
    }
}

/// Loads and validates a configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<ScoringConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_from_str(&data)
}

/// Loads and validates a configuration from a JSON string.
pub fn load_config_from_str(json: &str) -> Result<ScoringConfig, ConfigError> {
    let config: ScoringConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}
