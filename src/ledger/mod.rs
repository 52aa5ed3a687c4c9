//! Territory ledger.
//!
//! Pure decay and regeneration projections, the presentation view, and the
//! read-only service that creates and lists territories.

pub mod projection;
pub mod reader;
pub mod view;

pub use projection::{
    decay, elapsed_ms, next_visit_bonus_date, project, project_available_points, project_points,
    Projection,
};
pub use reader::Ledger;
pub use view::TerritoryView;
