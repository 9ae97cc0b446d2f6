pub mod change_requests;
pub mod health;
pub mod planning;
pub mod sites;
pub mod tasks;
pub mod tech_requests;
pub mod users;
pub mod weekly_pms;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Users
        .route("/users", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/users/:user_id", get(users::get_user))
        .route("/users/:user_id", put(users::update_user))
        .route("/users/:user_id", delete(users::delete_user))
        // Sites
        .route("/sites", get(sites::list_sites))
        .route("/sites", post(sites::create_site))
        .route("/sites/:site_id", get(sites::get_site))
        .route("/sites/:site_id", put(sites::update_site))
        // Task catalog
        .route("/tasks", get(tasks::list_tasks))
        // Weekly PMs
        .route("/weekly-pms", get(weekly_pms::list_pms))
        .route("/weekly-pms", post(weekly_pms::create_pm))
        .route("/weekly-pms/:pm_id", get(weekly_pms::get_pm))
        .route(
            "/weekly-pms/:pm_id/tasks/:task_id",
            put(weekly_pms::update_task_result),
        )
        .route("/weekly-pms/:pm_id/submit", post(weekly_pms::submit_pm))
        .route("/weekly-pms/:pm_id/cancel", post(weekly_pms::cancel_pm))
        .route("/weekly-pms/:pm_id/review", post(weekly_pms::review_pm))
        .route("/weekly-pms/:pm_id/comments", post(weekly_pms::add_comment))
        .route(
            "/weekly-pms/:pm_id/cr-number",
            put(weekly_pms::set_cr_number),
        )
        // Change requests
        .route("/change-requests", get(change_requests::list_change_requests))
        .route("/change-requests", post(change_requests::create_change_request))
        .route(
            "/change-requests/:cr_id",
            get(change_requests::get_change_request),
        )
        .route(
            "/change-requests/:cr_id",
            put(change_requests::update_change_request),
        )
        // Tech requests
        .route("/tech-requests", get(tech_requests::list_tech_requests))
        .route("/tech-requests", post(tech_requests::create_tech_request))
        .route("/tech-requests/:tr_id", get(tech_requests::get_tech_request))
        .route(
            "/tech-requests/:tr_id",
            put(tech_requests::update_tech_request),
        )
        .route(
            "/tech-requests/:tr_id/comments",
            post(tech_requests::add_comment),
        )
        // Planning
        .route("/planning/suggest", post(planning::suggest_plan))
        .route("/planning/apply", post(planning::apply_plan))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::util::ServiceExt;
    use uuid::Uuid;

    use crate::app::{create_app, AppState};
    use crate::config::{Environment, PlannerMode, Settings};
    use crate::domain::tasks::default_catalog;
    use crate::domain::users::{Role, User};
    use crate::services::{LocalPlanner, Store};

    fn test_state() -> Arc<AppState> {
        let settings = Settings {
            env: Environment::Dev,
            server_addr: String::new(),
            cors_allow_origins: Vec::new(),
            planner_mode: PlannerMode::Local,
            planner_service_url: String::new(),
            planner_service_token: String::new(),
            planner_timeout_seconds: 1,
            seed_data_path: None,
        };
        AppState::new(settings, Store::new(default_catalog()), Arc::new(LocalPlanner))
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = create_app(test_state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_reject_missing_or_unknown_identity() {
        let state = test_state();

        let response = create_app(state.clone())
            .oneshot(Request::get("/users").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = create_app(state)
            .oneshot(
                Request::get("/users")
                    .header("x-user-id", Uuid::new_v4().to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn known_identity_passes_the_extractor() {
        let state = test_state();
        let user = state
            .store
            .insert_user(User {
                id: Uuid::new_v4(),
                name: "Leila".to_string(),
                username: "leila".to_string(),
                email: "leila@example.com".to_string(),
                role: Role::Pm,
                avatar_url: None,
                password: None,
            })
            .unwrap();

        let response = create_app(state)
            .oneshot(
                Request::get("/users")
                    .header("x-user-id", user.id.to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
