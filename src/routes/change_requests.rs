//! Change request routes
//!
//! Anyone signed in can raise a CR against a site; only managers move its
//! status or priority.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{Paginated, PaginationParams};
use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::change_requests::{
    ChangeRequest, CrStatus, CreateChangeRequestRequest, UpdateChangeRequestRequest,
};
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct CrFilter {
    pub site_id: Option<Uuid>,
    pub status: Option<CrStatus>,
}

/// GET /change-requests
pub async fn list_change_requests(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<CrFilter>,
    Query(pagination): Query<PaginationParams>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let crs: Vec<ChangeRequest> = state
        .store
        .list_change_requests()
        .into_iter()
        .filter(|cr| filter.site_id.map_or(true, |s| cr.site_id == s))
        .filter(|cr| filter.status.map_or(true, |st| cr.status == st))
        .collect();
    Ok(Paginated::slice(crs, &pagination))
}

/// GET /change-requests/:cr_id
pub async fn get_change_request(
    State(state): State<Arc<AppState>>,
    Path(cr_id): Path<Uuid>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let cr = state
        .store
        .get_change_request(cr_id)
        .ok_or_else(|| ApiError::not_found("Change request not found"))?;
    Ok(Json(DataResponse::new(cr)))
}

/// POST /change-requests
pub async fn create_change_request(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CreateChangeRequestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.description.trim().is_empty() {
        return Err(ApiError::validation("description must not be empty"));
    }
    state
        .store
        .get_site(req.site_id)
        .ok_or_else(|| ApiError::not_found("Site not found"))?;

    let cr = state.store.insert_change_request(ChangeRequest {
        id: Uuid::new_v4(),
        site_id: req.site_id,
        kind: req.kind,
        description: req.description,
        submitted_by: auth.user_id,
        created_at: Utc::now(),
        status: CrStatus::Open,
        priority: req.priority,
        photos: req.photos,
    });

    Ok((StatusCode::CREATED, Json(DataResponse::new(cr))))
}

/// PUT /change-requests/:cr_id
pub async fn update_change_request(
    State(state): State<Arc<AppState>>,
    Path(cr_id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<UpdateChangeRequestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_manager()?;

    let mut cr = state
        .store
        .get_change_request(cr_id)
        .ok_or_else(|| ApiError::not_found("Change request not found"))?;

    if let Some(status) = req.status {
        cr.status = status;
    }
    if let Some(priority) = req.priority {
        cr.priority = priority;
    }

    let cr = state.store.replace_change_request(cr)?;
    Ok(Json(DataResponse::new(cr)))
}
