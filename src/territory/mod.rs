//! Territory representation.
//!
//! Contains team identifiers, the stored territory snapshot, and mission
//! rewards.

pub mod reward;
pub mod state;
pub mod team;

pub use reward::{Reward, RewardError};
pub use state::{Category, Coordinates, Territory, TerritoryId};
pub use team::{Team, TeamError, MAX_TEAM_LEN};
