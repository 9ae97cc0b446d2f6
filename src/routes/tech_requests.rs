//! Technician request routes
//!
//! Technicians raise requests to management; managers move them through
//! new -> in-review -> done/rejected. Comments are append-only, like PM
//! comments.

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
use crate::domain::tech_requests::{
    CreateTechRequestRequest, TechRequest, TechRequestKind, TechRequestStatus,
    UpdateTechRequestRequest,
};
use crate::domain::weekly_pm::{AddCommentRequest, Comment};
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct TechRequestFilter {
    pub technician_id: Option<Uuid>,
    pub status: Option<TechRequestStatus>,
}

/// GET /tech-requests
pub async fn list_tech_requests(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TechRequestFilter>,
    Query(pagination): Query<PaginationParams>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let requests: Vec<TechRequest> = state
        .store
        .list_tech_requests()
        .into_iter()
        // Technicians see their own requests; managers see everything.
        .filter(|tr| auth.is_manager() || tr.technician_id == auth.user_id)
        .filter(|tr| filter.technician_id.map_or(true, |t| tr.technician_id == t))
        .filter(|tr| filter.status.map_or(true, |st| tr.status == st))
        .collect();
    Ok(Paginated::slice(requests, &pagination))
}

/// GET /tech-requests/:tr_id
pub async fn get_tech_request(
    State(state): State<Arc<AppState>>,
    Path(tr_id): Path<Uuid>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let tr = state
        .store
        .get_tech_request(tr_id)
        .ok_or_else(|| ApiError::not_found("Tech request not found"))?;
    if !auth.is_manager() && tr.technician_id != auth.user_id {
        return Err(ApiError::forbidden("Not your request"));
    }
    Ok(Json(DataResponse::new(tr)))
}

/// POST /tech-requests
pub async fn create_tech_request(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CreateTechRequestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !auth.is_technician() {
        return Err(ApiError::forbidden("Technician role required"));
    }
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title must not be empty"));
    }
    match req.kind {
        TechRequestKind::Equipment if req.equipment.is_empty() => {
            return Err(ApiError::validation(
                "equipment requests need at least one item",
            ));
        }
        TechRequestKind::Issue | TechRequestKind::Suggestion
            if req.description.as_deref().unwrap_or("").trim().is_empty() =>
        {
            return Err(ApiError::validation("a description is required"));
        }
        _ => {}
    }

    let tr = state.store.insert_tech_request(TechRequest {
        id: Uuid::new_v4(),
        technician_id: auth.user_id,
        title: req.title,
        kind: req.kind,
        priority: req.priority,
        description: req.description,
        equipment: req.equipment,
        status: TechRequestStatus::New,
        comments: Vec::new(),
        created_at: Utc::now(),
    });

    Ok((StatusCode::CREATED, Json(DataResponse::new(tr))))
}

/// PUT /tech-requests/:tr_id
pub async fn update_tech_request(
    State(state): State<Arc<AppState>>,
    Path(tr_id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<UpdateTechRequestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_manager()?;

    let mut tr = state
        .store
        .get_tech_request(tr_id)
        .ok_or_else(|| ApiError::not_found("Tech request not found"))?;
    tr.status = req.status;

    let tr = state.store.replace_tech_request(tr)?;
    Ok(Json(DataResponse::new(tr)))
}

/// POST /tech-requests/:tr_id/comments
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path(tr_id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<AddCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::validation("comment text must not be empty"));
    }

    let mut tr = state
        .store
        .get_tech_request(tr_id)
        .ok_or_else(|| ApiError::not_found("Tech request not found"))?;
    if !auth.is_manager() && tr.technician_id != auth.user_id {
        return Err(ApiError::forbidden("Not your request"));
    }

    tr.comments.push(Comment {
        user_id: auth.user_id,
        text: req.text,
        timestamp: Utc::now(),
    });

    let tr = state.store.replace_tech_request(tr)?;
    Ok(Json(DataResponse::new(tr)))
}
