//! Turfwar scoring engine library.
//!
//! Territories accumulate a capped budget of claimable points over time,
//! completed missions capture points from that budget for their teams, and
//! team points decay so control has to be defended. Exposes the territory
//! types, the ledger projections, the settlement engine, storage
//! boundaries, and the command-line front end for use by integration tests
//! and the binaries.

pub mod clock;
pub mod config;
pub mod engine;
pub mod ledger;
pub mod protocol;
pub mod settle;
pub mod simulate;
pub mod store;
pub mod territory;
