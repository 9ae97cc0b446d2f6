//! Site routes
//!
//! Sites are managed by managers and read-mostly for everyone else. The only
//! referential rule: a site's technician, when set, must be an existing
//! Technician-role user.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{Paginated, PaginationParams};
use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::sites::{CreateSiteRequest, Site, UpdateSiteRequest};
use crate::error::ApiError;

fn check_technician_ref(state: &AppState, technician_id: Uuid) -> Result<(), ApiError> {
    let user = state
        .store
        .get_user(technician_id)
        .ok_or_else(|| ApiError::not_found("Technician not found"))?;
    if !user.role.is_technician() {
        return Err(ApiError::validation(
            "Assigned user does not have the technician role",
        ));
    }
    Ok(())
}

/// GET /sites
pub async fn list_sites(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Paginated::slice(state.store.list_sites(), &pagination))
}

/// GET /sites/:site_id
pub async fn get_site(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<Uuid>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let site = state
        .store
        .get_site(site_id)
        .ok_or_else(|| ApiError::not_found("Site not found"))?;
    Ok(Json(DataResponse::new(site)))
}

/// POST /sites
pub async fn create_site(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CreateSiteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_manager()?;

    if req.name.trim().is_empty() {
        return Err(ApiError::validation("site name must not be empty"));
    }
    if let Some(technician_id) = req.technician_id {
        check_technician_ref(&state, technician_id)?;
    }

    let site = state.store.insert_site(Site {
        id: Uuid::new_v4(),
        name: req.name,
        location: req.location,
        image_url: req.image_url,
        image_hint: req.image_hint,
        technician_id: req.technician_id,
    });

    Ok((StatusCode::CREATED, Json(DataResponse::new(site))))
}

/// PUT /sites/:site_id
pub async fn update_site(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<UpdateSiteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_manager()?;

    let mut site = state
        .store
        .get_site(site_id)
        .ok_or_else(|| ApiError::not_found("Site not found"))?;

    if let Some(name) = req.name {
        site.name = name;
    }
    if let Some(location) = req.location {
        site.location = location;
    }
    if let Some(image_url) = req.image_url {
        site.image_url = Some(image_url);
    }
    if let Some(image_hint) = req.image_hint {
        site.image_hint = Some(image_hint);
    }
    if req.unassign_technician {
        site.technician_id = None;
    } else if let Some(technician_id) = req.technician_id {
        check_technician_ref(&state, technician_id)?;
        site.technician_id = Some(technician_id);
    }

    let site = state.store.replace_site(site)?;
    Ok(Json(DataResponse::new(site)))
}
