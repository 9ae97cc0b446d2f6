//! Task catalog route. The catalog is immutable at runtime.

use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::error::ApiError;

/// GET /tasks
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(DataResponse::new(state.store.task_catalog())))
}
