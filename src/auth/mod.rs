//! Identity and role resolution.
//!
//! Session management lives outside this service; an upstream gateway
//! authenticates the user and forwards their id in `x-user-id`. This module
//! resolves that id against the user store and exposes the role checks the
//! role-gated operations need.

mod context;
mod extract;

pub use context::AuthContext;
pub use extract::{AuthError, RequireAuth};
