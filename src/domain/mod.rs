//! Domain types and DTOs
//!
//! Entity definitions shared by the store, the planning core, and the HTTP
//! surface. Status families are closed enums; transitions go through explicit
//! checks instead of in-place string rewrites.

#![allow(dead_code)]

pub mod change_requests;
pub mod sites;
pub mod tasks;
pub mod tech_requests;
pub mod users;
pub mod weekly_pm;

pub use sites::*;
pub use tasks::*;
pub use users::*;
pub use weekly_pm::*;

// Change/tech request types are accessed via their modules to keep the
// Persian-labelled CR enums out of the common namespace.
