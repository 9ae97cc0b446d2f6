use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

/// Which implementation backs the planning suggestion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerMode {
    /// Deterministic in-process composer.
    Local,
    /// External generative reasoning service.
    Remote,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Planning service
    pub planner_mode: PlannerMode,
    pub planner_service_url: String,
    pub planner_service_token: String,
    pub planner_timeout_seconds: u64,

    // Optional JSON snapshot loaded into the store at startup
    pub seed_data_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Planning service
        let planner_mode = match env::var("PLANNER_MODE")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "remote" => PlannerMode::Remote,
            _ => PlannerMode::Local,
        };
        let planner_service_url = if planner_mode == PlannerMode::Remote {
            env::var("PLANNER_SERVICE_URL").context("PLANNER_SERVICE_URL must be set")?
        } else {
            env::var("PLANNER_SERVICE_URL").unwrap_or_default()
        };
        let planner_service_token = if planner_mode == PlannerMode::Remote {
            env::var("PLANNER_SERVICE_TOKEN").context("PLANNER_SERVICE_TOKEN must be set")?
        } else {
            env::var("PLANNER_SERVICE_TOKEN").unwrap_or_default()
        };
        let planner_timeout_seconds = env::var("PLANNER_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8); // keep the reasoning call bounded to a few seconds

        let seed_data_path = env::var("SEED_DATA_PATH").ok().map(PathBuf::from);

        Ok(Settings {
            env,
            server_addr,
            cors_allow_origins,
            planner_mode,
            planner_service_url,
            planner_service_token,
            planner_timeout_seconds,
            seed_data_path,
        })
    }
}
