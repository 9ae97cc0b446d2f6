//! Weekly PM routes
//!
//! Managers create, cancel and review PMs; the assigned technician fills in
//! task results and submits. Every status change goes through the PmStatus
//! transition checks, so an illegal move is rejected before the store sees it.

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
use crate::auth::{AuthContext, RequireAuth};
use crate::domain::tasks::{TaskResult, TaskResultPatch};
use crate::domain::weekly_pm::{
    AddCommentRequest, Comment, CreateWeeklyPmRequest, PmStatus, SetCrNumberRequest, WeekId,
    WeeklyPm,
};
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct PmFilter {
    pub week: Option<WeekId>,
    pub site_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub status: Option<PmStatus>,
}

/// GET /weekly-pms
pub async fn list_pms(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<PmFilter>,
    Query(pagination): Query<PaginationParams>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let pms: Vec<WeeklyPm> = state
        .store
        .list_pms()
        .into_iter()
        .filter(|pm| filter.week.map_or(true, |w| pm.week == w))
        .filter(|pm| filter.site_id.map_or(true, |s| pm.site_id == s))
        .filter(|pm| {
            filter
                .technician_id
                .map_or(true, |t| pm.assigned_technician_id == Some(t))
        })
        .filter(|pm| filter.status.map_or(true, |st| pm.status == st))
        .collect();

    Ok(Paginated::slice(pms, &pagination))
}

/// GET /weekly-pms/:pm_id
pub async fn get_pm(
    State(state): State<Arc<AppState>>,
    Path(pm_id): Path<Uuid>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let pm = state
        .store
        .get_pm(pm_id)
        .ok_or_else(|| ApiError::not_found("Weekly PM not found"))?;
    Ok(Json(DataResponse::new(pm)))
}

/// POST /weekly-pms
///
/// Manager creates a single PM outside the planner flow. The technician is
/// copied from the site and the task list from the catalog.
pub async fn create_pm(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CreateWeeklyPmRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_manager()?;

    let site = state
        .store
        .get_site(req.site_id)
        .ok_or_else(|| ApiError::not_found("Site not found"))?;

    let catalog = state.store.task_catalog();
    let pm = state.store.add_pm(WeeklyPm {
        id: Uuid::new_v4(),
        week: req.week,
        site_id: site.id,
        assigned_technician_id: site.technician_id,
        status: PmStatus::Pending,
        tasks: catalog.iter().map(TaskResult::blank_for).collect(),
        cr_number: None,
        comments: Vec::new(),
    })?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(pm))))
}

fn require_assigned_technician(auth: &AuthContext, pm: &WeeklyPm) -> Result<(), ApiError> {
    if pm.assigned_technician_id == Some(auth.user_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Only the assigned technician may do this",
        ))
    }
}

fn require_participant(auth: &AuthContext, pm: &WeeklyPm) -> Result<(), ApiError> {
    if auth.is_manager() || pm.assigned_technician_id == Some(auth.user_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Only managers or the assigned technician may do this",
        ))
    }
}

/// PUT /weekly-pms/:pm_id/tasks/:task_id
///
/// Assigned technician records the outcome of one catalog task. Allowed only
/// while the PM is still open.
pub async fn update_task_result(
    State(state): State<Arc<AppState>>,
    Path((pm_id, task_id)): Path<(Uuid, Uuid)>,
    auth: RequireAuth,
    Json(patch): Json<TaskResultPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let mut pm = state
        .store
        .get_pm(pm_id)
        .ok_or_else(|| ApiError::not_found("Weekly PM not found"))?;
    require_assigned_technician(&auth, &pm)?;

    if !matches!(pm.status, PmStatus::Pending | PmStatus::InProgress) {
        return Err(ApiError::validation(format!(
            "Cannot edit task results of a {:?} PM",
            pm.status
        )));
    }

    let task = pm
        .tasks
        .iter_mut()
        .find(|t| t.task_id == task_id)
        .ok_or_else(|| ApiError::not_found("Task not part of this PM"))?;

    if let Some(is_completed) = patch.is_completed {
        task.is_completed = is_completed;
    }
    if let Some(notes) = patch.notes {
        task.notes = notes;
    }
    if let Some(photos) = patch.photos {
        task.photos = photos;
    }
    if let Some(location) = patch.location {
        task.location = Some(location);
    }
    if let Some(checklist) = patch.checklist {
        task.checklist = checklist;
    }
    if let Some(custom_fields) = patch.custom_fields {
        task.custom_fields = custom_fields;
    }

    let pm = state.store.replace_pm(pm)?;
    Ok(Json(DataResponse::new(pm)))
}

/// POST /weekly-pms/:pm_id/submit
///
/// Technician submit: Completed when every task result is done, otherwise the
/// PM moves to (or stays) InProgress.
pub async fn submit_pm(
    State(state): State<Arc<AppState>>,
    Path(pm_id): Path<Uuid>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let mut pm = state
        .store
        .get_pm(pm_id)
        .ok_or_else(|| ApiError::not_found("Weekly PM not found"))?;
    require_assigned_technician(&auth, &pm)?;

    let next = pm.status_after_submit();
    if next != pm.status {
        if !pm.status.can_transition_to(next) {
            return Err(ApiError::validation(format!(
                "Cannot submit a {:?} PM",
                pm.status
            )));
        }
        pm.status = next;
    }

    let pm = state.store.replace_pm(pm)?;
    Ok(Json(DataResponse::new(pm)))
}

/// POST /weekly-pms/:pm_id/cancel
pub async fn cancel_pm(
    State(state): State<Arc<AppState>>,
    Path(pm_id): Path<Uuid>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_manager()?;

    let mut pm = state
        .store
        .get_pm(pm_id)
        .ok_or_else(|| ApiError::not_found("Weekly PM not found"))?;

    if !pm.status.is_cancellable() {
        return Err(ApiError::validation(format!(
            "Cannot cancel a {:?} PM",
            pm.status
        )));
    }
    pm.status = PmStatus::Cancelled;

    let pm = state.store.replace_pm(pm)?;
    Ok(Json(DataResponse::new(pm)))
}

/// POST /weekly-pms/:pm_id/review
///
/// Explicit manager sign-off on a completed PM.
pub async fn review_pm(
    State(state): State<Arc<AppState>>,
    Path(pm_id): Path<Uuid>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_manager()?;

    let mut pm = state
        .store
        .get_pm(pm_id)
        .ok_or_else(|| ApiError::not_found("Weekly PM not found"))?;

    if !pm.status.can_transition_to(PmStatus::Reviewed) {
        return Err(ApiError::validation(format!(
            "Cannot review a {:?} PM",
            pm.status
        )));
    }
    pm.status = PmStatus::Reviewed;

    let pm = state.store.replace_pm(pm)?;
    Ok(Json(DataResponse::new(pm)))
}

/// POST /weekly-pms/:pm_id/comments
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path(pm_id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<AddCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::validation("comment text must not be empty"));
    }

    let mut pm = state
        .store
        .get_pm(pm_id)
        .ok_or_else(|| ApiError::not_found("Weekly PM not found"))?;
    require_participant(&auth, &pm)?;

    // Append-only; existing comments are never rewritten.
    pm.comments.push(Comment {
        user_id: auth.user_id,
        text: req.text,
        timestamp: Utc::now(),
    });

    let pm = state.store.replace_pm(pm)?;
    Ok(Json(DataResponse::new(pm)))
}

/// PUT /weekly-pms/:pm_id/cr-number
pub async fn set_cr_number(
    State(state): State<Arc<AppState>>,
    Path(pm_id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<SetCrNumberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut pm = state
        .store
        .get_pm(pm_id)
        .ok_or_else(|| ApiError::not_found("Weekly PM not found"))?;
    require_participant(&auth, &pm)?;

    pm.cr_number = req.cr_number;

    let pm = state.store.replace_pm(pm)?;
    Ok(Json(DataResponse::new(pm)))
}
