//! Settlement of completed missions.
//!
//! Projects a territory to now, grants a reward against its budget,
//! re-derives the controlling team, and stores the result as the next
//! snapshot.

pub mod apply;
pub mod settler;

use thiserror::Error;

use crate::store::StoreError;
use crate::territory::{RewardError, TerritoryId};

pub use apply::{apply_reward, determine_controller, Grant, Settlement};
pub use settler::Settler;

/// Errors returned by a settlement. On any error the stored snapshot is
/// unchanged.
#[derive(Debug, Error)]
pub enum SettleError {
    #[error("territory '{0}' not found")]
    NotFound(TerritoryId),

    #[error("gave up settling territory '{id}' after {attempts} conflicting attempts")]
    Concurrency { id: TerritoryId, attempts: u32 },

    #[error("persistence failure: {0}")]
    Persistence(#[source] StoreError),

    #[error("invalid reward: {0}")]
    Validation(#[from] RewardError),
}

impl From<StoreError> for SettleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => SettleError::NotFound(id),
            other => SettleError::Persistence(other),
        }
    }
}
