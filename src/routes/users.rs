//! User routes
//!
//! Account management. Role changes are admin-only and never on yourself;
//! nobody deletes their own account.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{Paginated, PaginationParams};
use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::users::{CreateUserRequest, UpdateUserRequest, User, UserResponse};
use crate::error::ApiError;

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let users: Vec<UserResponse> = state
        .store
        .list_users()
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Paginated::slice(users, &pagination))
}

/// GET /users/:user_id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .store
        .get_user(user_id)
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(DataResponse::new(UserResponse::from(user))))
}

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_manager()?;

    if req.username.trim().is_empty() {
        return Err(ApiError::validation("username must not be empty"));
    }
    if req.name.trim().is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }

    let user = state.store.insert_user(User {
        id: Uuid::new_v4(),
        name: req.name,
        username: req.username,
        email: req.email,
        role: req.role,
        avatar_url: req.avatar_url,
        password: req.password,
    })?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(UserResponse::from(user))),
    ))
}

/// PUT /users/:user_id
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Admins edit anyone; everyone else edits only their own profile.
    if !auth.is_admin() && auth.user_id != user_id {
        return Err(ApiError::forbidden("Cannot edit another user"));
    }

    let mut user = state
        .store
        .get_user(user_id)
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if let Some(role) = req.role {
        auth.require_admin()?;
        if auth.user_id == user_id {
            return Err(ApiError::forbidden("Cannot change your own role"));
        }
        user.role = role;
    }
    if let Some(name) = req.name {
        user.name = name;
    }
    if let Some(username) = req.username {
        if username.trim().is_empty() {
            return Err(ApiError::validation("username must not be empty"));
        }
        user.username = username;
    }
    if let Some(email) = req.email {
        user.email = email;
    }
    if let Some(avatar_url) = req.avatar_url {
        user.avatar_url = Some(avatar_url);
    }

    let user = state.store.replace_user(user)?;
    Ok(Json(DataResponse::new(UserResponse::from(user))))
}

/// DELETE /users/:user_id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;
    if auth.user_id == user_id {
        return Err(ApiError::forbidden("Cannot delete your own account"));
    }

    state.store.delete_user(user_id)?;
    Ok(Json(MessageResponse::new("User deleted")))
}
