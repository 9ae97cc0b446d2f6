mod api;
mod app;
mod auth;
mod config;
mod domain;
mod error;
mod logging;
mod middleware;
mod planning;
mod routes;
mod services;

use std::sync::Arc;

use anyhow::Result;

use config::PlannerMode;
use services::{LocalPlanner, PlanningService, RemotePlanner, Store};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        planner_mode = ?settings.planner_mode,
        "Starting SiteWise PM backend"
    );

    // Build the document store, seeded from disk when configured
    let store = match &settings.seed_data_path {
        Some(path) => Store::from_seed_file(path)?,
        None => Store::new(domain::tasks::default_catalog()),
    };

    // Planning service collaborator
    let planner: Arc<dyn PlanningService> = match settings.planner_mode {
        PlannerMode::Local => Arc::new(LocalPlanner),
        PlannerMode::Remote => Arc::new(RemotePlanner::new(
            &settings.planner_service_url,
            &settings.planner_service_token,
            settings.planner_timeout_seconds,
        )?),
    };

    // Check planner health without blocking startup
    tokio::spawn({
        let planner = planner.clone();
        async move {
            match planner.health_check().await {
                Ok(()) => tracing::info!("Planning service is healthy"),
                Err(e) => tracing::warn!(error = %e, "Planning service health check failed - will surface on first request"),
            }
        }
    });

    // Create application state
    let state = app::AppState::new(settings.clone(), store, planner);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
