//! Planning routes
//!
//! `suggest` runs the overdue detector over a store snapshot, asks the
//! planning service for a weekly suggestion and validates it against the
//! planning contract - nothing is persisted. `apply` materialises an accepted
//! suggestion into Pending PMs in one atomic batch, so a failed or raced
//! apply leaves the store untouched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::weekly_pm::{WeekId, WeeklyPm};
use crate::error::ApiError;
use crate::middleware::RequestIdExt;
use crate::planning::{
    build_planned_pms, compute_overdue_sites, validate_suggestion, PlanSuggestion, SuggestedPm,
};
use crate::services::planner::PlanContext;

const MAX_TARGET_SITE_COUNT: usize = 200;

#[derive(Debug, Deserialize)]
pub struct SuggestPlanRequest {
    pub week: WeekId,
    pub target_site_count: usize,
    /// Overdue detection reference; defaults to today.
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct SuggestPlanResponse {
    pub week: WeekId,
    pub overdue_site_count: usize,
    pub suggestion: PlanSuggestion,
}

#[derive(Debug, Deserialize)]
pub struct ApplyPlanRequest {
    pub week: WeekId,
    pub suggested_pms: Vec<SuggestedPm>,
}

fn plan_context(state: &AppState, week: WeekId, target: usize, reference: NaiveDate) -> PlanContext {
    let all_sites = state.store.list_sites();
    let pms = state.store.list_pms();

    let overdue_sites = compute_overdue_sites(&all_sites, &pms, reference);
    let existing_week_site_ids: HashSet<Uuid> = pms
        .iter()
        .filter(|pm| pm.week == week)
        .map(|pm| pm.site_id)
        .collect();

    let mut last_scheduled: HashMap<Uuid, WeekId> = HashMap::new();
    for pm in &pms {
        last_scheduled
            .entry(pm.site_id)
            .and_modify(|w| *w = (*w).max(pm.week))
            .or_insert(pm.week);
    }

    let technicians = state
        .store
        .list_users()
        .into_iter()
        .filter(|u| u.role.is_technician())
        .collect();

    PlanContext {
        overdue_sites,
        all_sites,
        technicians,
        existing_week_site_ids,
        last_scheduled,
        target_site_count: target,
    }
}

/// POST /planning/suggest
pub async fn suggest_plan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    auth: RequireAuth,
    Json(req): Json<SuggestPlanRequest>,
) -> Result<Json<DataResponse<SuggestPlanResponse>>, ApiError> {
    auth.require_manager()?;

    if req.target_site_count == 0 || req.target_site_count > MAX_TARGET_SITE_COUNT {
        return Err(ApiError::validation(format!(
            "target_site_count must be between 1 and {MAX_TARGET_SITE_COUNT}"
        )));
    }

    let reference = req
        .reference_date
        .unwrap_or_else(|| Utc::now().date_naive());
    let ctx = plan_context(&state, req.week, req.target_site_count, reference);

    tracing::info!(
        week = %req.week,
        overdue = ctx.overdue_sites.len(),
        target = ctx.target_site_count,
        "Requesting weekly plan suggestion"
    );

    let suggestion = state.planner.suggest(&ctx, headers.request_id()).await?;

    // Contract validation applies to every suggestion, local or remote.
    validate_suggestion(&suggestion, &ctx.compose_ctx())?;

    Ok(Json(DataResponse::new(SuggestPlanResponse {
        week: req.week,
        overdue_site_count: ctx.overdue_sites.len(),
        suggestion,
    })))
}

/// POST /planning/apply
pub async fn apply_plan(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<ApplyPlanRequest>,
) -> Result<(StatusCode, Json<DataResponse<Vec<WeeklyPm>>>), ApiError> {
    auth.require_manager()?;

    if req.suggested_pms.is_empty() {
        return Err(ApiError::validation("plan has no entries"));
    }

    let catalog = state.store.task_catalog();
    let sites = state.store.list_sites();

    let batch = build_planned_pms(&req.suggested_pms, req.week, &catalog, &sites)
        .map_err(|e| ApiError::not_found(e.to_string()))?;

    // The store checks the whole batch for (site, week) duplicates under one
    // lock; a clash applies nothing.
    let created = state.store.add_pms(batch)?;

    tracing::info!(week = %req.week, created = created.len(), "Weekly plan applied");

    Ok((StatusCode::CREATED, Json(DataResponse::new(created))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::async_trait;

    use crate::auth::AuthContext;
    use crate::config::{Environment, PlannerMode, Settings};
    use crate::domain::sites::Site;
    use crate::domain::tasks::default_catalog;
    use crate::domain::users::Role;
    use crate::planning::PlanningError;
    use crate::services::{LocalPlanner, PlanningService, Store};

    struct FailingPlanner;

    #[async_trait]
    impl PlanningService for FailingPlanner {
        async fn suggest(
            &self,
            _ctx: &PlanContext,
            _request_id: Option<&str>,
        ) -> Result<PlanSuggestion, PlanningError> {
            Err(PlanningError::Unavailable("connection refused".to_string()))
        }

        async fn health_check(&self) -> Result<(), PlanningError> {
            Err(PlanningError::Unavailable("connection refused".to_string()))
        }
    }

    fn settings() -> Settings {
        Settings {
            env: Environment::Dev,
            server_addr: String::new(),
            cors_allow_origins: Vec::new(),
            planner_mode: PlannerMode::Local,
            planner_service_url: String::new(),
            planner_service_token: String::new(),
            planner_timeout_seconds: 1,
            seed_data_path: None,
        }
    }

    fn state_with(planner: Arc<dyn PlanningService>, sites: &[Site]) -> Arc<AppState> {
        let store = Store::new(default_catalog());
        for site in sites {
            store.insert_site(site.clone());
        }
        AppState::new(settings(), store, planner)
    }

    fn site(name: &str) -> Site {
        Site {
            id: Uuid::new_v4(),
            name: name.to_string(),
            location: "Shiraz, Fars".to_string(),
            image_url: None,
            image_hint: None,
            technician_id: Some(Uuid::new_v4()),
        }
    }

    fn manager() -> RequireAuth {
        RequireAuth(AuthContext {
            user_id: Uuid::new_v4(),
            name: "manager".to_string(),
            role: Role::Pm,
        })
    }

    fn technician() -> RequireAuth {
        RequireAuth(AuthContext {
            user_id: Uuid::new_v4(),
            name: "tech".to_string(),
            role: Role::Technician,
        })
    }

    fn week() -> WeekId {
        WeekId::new(2024, 30).unwrap()
    }

    #[tokio::test]
    async fn suggest_and_apply_round_trip_creates_pending_pms() {
        let sites = vec![site("s1"), site("s2"), site("s3")];
        let state = state_with(Arc::new(LocalPlanner), &sites);

        let response = suggest_plan(
            State(state.clone()),
            HeaderMap::new(),
            manager(),
            Json(SuggestPlanRequest {
                week: week(),
                target_site_count: 2,
                reference_date: NaiveDate::from_ymd_opt(2024, 7, 25),
            }),
        )
        .await
        .unwrap();

        let suggestion = response.0.data.suggestion;
        assert_eq!(suggestion.suggested_pms.len(), 2);

        let (status, created) = apply_plan(
            State(state.clone()),
            manager(),
            Json(ApplyPlanRequest {
                week: week(),
                suggested_pms: suggestion.suggested_pms.clone(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.0.data.len(), 2);
        assert_eq!(state.store.pms_by_week(week()).len(), 2);
    }

    #[tokio::test]
    async fn failed_planning_call_leaves_the_store_unchanged() {
        let sites = vec![site("s1")];
        let state = state_with(Arc::new(FailingPlanner), &sites);
        let before = state.store.list_pms().len();

        let result = suggest_plan(
            State(state.clone()),
            HeaderMap::new(),
            manager(),
            Json(SuggestPlanRequest {
                week: week(),
                target_site_count: 3,
                reference_date: None,
            }),
        )
        .await;

        assert!(matches!(result, Err(ApiError::Planning(_))));
        assert_eq!(state.store.list_pms().len(), before);
    }

    #[tokio::test]
    async fn double_apply_conflicts_and_applies_nothing() {
        let sites = vec![site("s1"), site("s2")];
        let state = state_with(Arc::new(LocalPlanner), &sites);

        let suggested: Vec<SuggestedPm> = sites
            .iter()
            .map(|s| SuggestedPm {
                site_id: s.id,
                technician_id: s.technician_id,
            })
            .collect();

        apply_plan(
            State(state.clone()),
            manager(),
            Json(ApplyPlanRequest {
                week: week(),
                suggested_pms: suggested.clone(),
            }),
        )
        .await
        .unwrap();

        let result = apply_plan(
            State(state.clone()),
            manager(),
            Json(ApplyPlanRequest {
                week: week(),
                suggested_pms: suggested,
            }),
        )
        .await;

        assert!(matches!(result, Err(ApiError::Conflict(_))));
        assert_eq!(state.store.pms_by_week(week()).len(), 2);
    }

    #[tokio::test]
    async fn suggest_excludes_sites_already_scheduled_for_the_week() {
        let sites = vec![site("s1"), site("s2"), site("s3")];
        let state = state_with(Arc::new(LocalPlanner), &sites);

        // s2 already has a PM this week.
        apply_plan(
            State(state.clone()),
            manager(),
            Json(ApplyPlanRequest {
                week: week(),
                suggested_pms: vec![SuggestedPm {
                    site_id: sites[1].id,
                    technician_id: sites[1].technician_id,
                }],
            }),
        )
        .await
        .unwrap();

        let response = suggest_plan(
            State(state.clone()),
            HeaderMap::new(),
            manager(),
            Json(SuggestPlanRequest {
                week: week(),
                target_site_count: 5,
                reference_date: NaiveDate::from_ymd_opt(2024, 7, 25),
            }),
        )
        .await
        .unwrap();

        let ids: Vec<Uuid> = response
            .0
            .data
            .suggestion
            .suggested_pms
            .iter()
            .map(|p| p.site_id)
            .collect();
        assert!(!ids.contains(&sites[1].id));
        assert!(ids.contains(&sites[0].id));
        assert!(ids.contains(&sites[2].id));
    }

    #[tokio::test]
    async fn planning_is_manager_only() {
        let state = state_with(Arc::new(LocalPlanner), &[site("s1")]);

        let result = suggest_plan(
            State(state.clone()),
            HeaderMap::new(),
            technician(),
            Json(SuggestPlanRequest {
                week: week(),
                target_site_count: 1,
                reference_date: None,
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));

        let result = apply_plan(
            State(state),
            technician(),
            Json(ApplyPlanRequest {
                week: week(),
                suggested_pms: vec![SuggestedPm {
                    site_id: Uuid::new_v4(),
                    technician_id: None,
                }],
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn target_site_count_is_validated() {
        let state = state_with(Arc::new(LocalPlanner), &[site("s1")]);

        let result = suggest_plan(
            State(state),
            HeaderMap::new(),
            manager(),
            Json(SuggestPlanRequest {
                week: week(),
                target_site_count: 0,
                reference_date: None,
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
