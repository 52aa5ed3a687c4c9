//! Mission rewards.
//!
//! A reward is the ordered list of points each team asks to capture when a
//! mission completes. Order matters: settlement grants requests first-come
//! against the shared budget, so the caller-supplied order is kept as is.

use thiserror::Error;

use super::team::{Team, TeamError};

/// Errors that can occur when building a reward.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RewardError {
    #[error(transparent)]
    InvalidTeam(#[from] TeamError),

    #[error("negative points ({points}) requested for team '{team}'")]
    NegativePoints { team: Team, points: i64 },

    #[error("team '{0}' appears more than once in the reward")]
    DuplicateTeam(Team),
}

/// A validated mission reward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reward {
    requests: Vec<(Team, u64)>,
}

impl Reward {
    pub fn new() -> Self {
        Reward::default()
    }

    /// Builds a reward from raw `(team, points)` pairs, rejecting the whole
    /// reward if any entry is malformed.
    pub fn from_requests<I, S>(requests: I) -> Result<Reward, RewardError>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        let mut reward = Reward::new();
        for (name, points) in requests {
            let team = Team::new(name.as_ref())?;
            if points < 0 {
                return Err(RewardError::NegativePoints { team, points });
            }
            reward.push(team, points as u64)?;
        }
        Ok(reward)
    }

    /// Appends a request. Fails if the team is already present.
    pub fn push(&mut self, team: Team, points: u64) -> Result<(), RewardError> {
        if self.requests.iter().any(|(t, _)| *t == team) {
            return Err(RewardError::DuplicateTeam(team));
        }
        self.requests.push((team, points));
        Ok(())
    }

    /// Iterates requests in the order they were supplied.
    pub fn iter(&self) -> impl Iterator<Item = (&Team, u64)> + '_ {
        self.requests.iter().map(|(t, p)| (t, *p))
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn total_requested(&self) -> u64 {
        self.requests
            .iter()
            .fold(0u64, |acc, (_, p)| acc.saturating_add(*p))
    }
}
