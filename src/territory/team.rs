//! Team identifiers.
//!
//! Teams are open-ended: the configuration lists the teams every projection
//! must report, but a reward may name any well-formed team. Identifiers are
//! normalized to lowercase so `Red` and `red` are the same team, and their
//! `Ord` is the lexicographic order used when scanning for a controller.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a team identifier.
pub const MAX_TEAM_LEN: usize = 32;

/// Errors produced when parsing a team identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TeamError {
    #[error("empty team name")]
    Empty,

    #[error("team name '{0}' is longer than {max} characters", max = MAX_TEAM_LEN)]
    TooLong(String),

    #[error("invalid character '{ch}' in team name '{name}'")]
    InvalidChar { name: String, ch: char },
}

/// A team identifier such as `red` or `blue`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Team(String);

impl Team {
    /// Parses and normalizes a team name.
    ///
    /// Accepts ASCII letters, digits, `-` and `_`.
    pub fn new(name: &str) -> Result<Team, TeamError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TeamError::Empty);
        }
        if name.len() > MAX_TEAM_LEN {
            return Err(TeamError::TooLong(name.to_string()));
        }
        if let Some(ch) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(TeamError::InvalidChar {
                name: name.to_string(),
                ch,
            });
        }
        Ok(Team(name.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Team {
    type Error = TeamError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Team::new(&value)
    }
}

impl From<Team> for String {
    fn from(team: Team) -> String {
        team.0
    }
}
