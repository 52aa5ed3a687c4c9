//! Territory snapshot representation.
//!
//! A `Territory` is the last authoritative state of a location: per-team
//! points and the available budget as of `snapshot_time`. Current values are
//! never stored; they are projected from the snapshot at read time (see
//! `crate::ledger`).

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::team::Team;

/// Opaque territory identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerritoryId(String);

impl TerritoryId {
    pub fn new(id: impl Into<String>) -> Self {
        TerritoryId(id.into())
    }

    /// Generates a random 24-character hex identifier.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let bytes: [u8; 12] = rng.gen();
        let mut id = String::with_capacity(24);
        for b in bytes {
            id.push_str(&format!("{:02x}", b));
        }
        TerritoryId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TerritoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kind of business at a territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Gastronomy,
    Retail,
}

impl Category {
    pub const fn name(self) -> &'static str {
        match self {
            Category::Gastronomy => "gastronomy",
            Category::Retail => "retail",
        }
    }

    /// Parses a category from its lowercase name.
    pub fn from_name(s: &str) -> Option<Category> {
        match s.to_ascii_lowercase().as_str() {
            "gastronomy" => Some(Category::Gastronomy),
            "retail" => Some(Category::Retail),
            _ => None,
        }
    }
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Returns `None` unless both values are finite and within range.
    pub fn new(lat: f64, lng: f64) -> Option<Coordinates> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then_some(Coordinates { lat, lng })
    }
}

/// Stored snapshot of a territory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    pub id: TerritoryId,
    pub name: String,
    pub category: Category,
    pub coordinates: Coordinates,
    /// Points per team as of `snapshot_time`.
    pub points_by_team: BTreeMap<Team, u64>,
    /// Unclaimed budget as of `snapshot_time`.
    pub available_points: u64,
    pub controlling_team: Option<Team>,
    pub snapshot_time: DateTime<Utc>,
    /// Bumped on every write; used for compare-and-swap saves.
    pub version: u64,
}

impl Territory {
    /// Creates a fresh territory with no points and no controller.
    pub fn new(
        id: TerritoryId,
        name: impl Into<String>,
        category: Category,
        coordinates: Coordinates,
        available_points: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Territory {
            id,
            name: name.into(),
            category,
            coordinates,
            points_by_team: BTreeMap::new(),
            available_points,
            controlling_team: None,
            snapshot_time: now,
            version: 0,
        }
    }

    /// Stored (not projected) points for a team, 0 if absent.
    pub fn stored_points(&self, team: &Team) -> u64 {
        self.points_by_team.get(team).copied().unwrap_or(0)
    }
}
