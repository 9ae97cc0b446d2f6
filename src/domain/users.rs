//! User domain types
//!
//! Accounts for everyone who touches the PM workflow. Role gating happens in
//! the routes; the helpers here just answer "who counts as a manager".

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User role enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Pm,
    Technician,
    RegionalManager,
}

impl Role {
    /// Admins, PMs and regional managers share the management dashboards.
    pub fn is_manager(self) -> bool {
        matches!(self, Self::Admin | Self::Pm | Self::RegionalManager)
    }

    pub fn is_technician(self) -> bool {
        matches!(self, Self::Technician)
    }
}

/// User entity
///
/// `password` exists only for the mock sign-in flow and is never serialized
/// back out; `UserResponse` is the outbound shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

/// Request DTO for creating a user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Request DTO for updating a user
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Only admins may change roles, and never their own.
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Response DTO for user (password stripped)
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub avatar_url: Option<String>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            username: u.username,
            email: u.email,
            role: u.role,
            avatar_url: u.avatar_url,
        }
    }
}
