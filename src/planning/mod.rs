//! PM planning core
//!
//! Pure, deterministic logic behind the weekly planning feature: overdue-site
//! detection over the current half-year, plan composition with duplicate
//! exclusion and target-count capping, and materialisation of suggested
//! assignments into Pending PM records. The natural-language side of planning
//! lives behind `services::planner`; nothing in this module does I/O.

pub mod apply;
pub mod composer;
pub mod overdue;

pub use apply::build_planned_pms;
pub use composer::{compose, validate_suggestion, ComposeContext, PlanSuggestion, SuggestedPm};
pub use overdue::compute_overdue_sites;

use thiserror::Error;

/// Failure of the planning operation, before anything is persisted.
///
/// All variants abort the whole operation; callers never apply a partial plan
/// and never auto-retry.
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("planning service unavailable: {0}")]
    Unavailable(String),

    #[error("planning service returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("suggested plan violates the planning contract: {0}")]
    Contract(String),
}
