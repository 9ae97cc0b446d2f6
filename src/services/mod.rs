//! Service layer modules.
//!
//! The injected document store and the client for the external planning
//! (reasoning) service.

pub mod planner;
pub mod store;

pub use planner::{LocalPlanner, PlanningService, RemotePlanner};
pub use store::Store;
