use uuid::Uuid;

use crate::domain::users::{Role, User};
use crate::error::ApiError;

/// Resolved identity of the requesting user.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub name: String,
    pub role: Role,
}

impl AuthContext {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            role: user.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admin, PM or regional manager.
    pub fn is_manager(&self) -> bool {
        self.role.is_manager()
    }

    pub fn is_technician(&self) -> bool {
        self.role.is_technician()
    }

    /// Guard for manager-only operations.
    pub fn require_manager(&self) -> Result<(), ApiError> {
        if self.is_manager() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Manager role required"))
        }
    }

    /// Guard for admin-only operations.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin role required"))
        }
    }
}
