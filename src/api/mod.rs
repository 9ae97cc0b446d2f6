//! Shared API helpers: response wrappers and pagination.

pub mod pagination;
pub mod response;
