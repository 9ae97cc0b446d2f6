//! Planning service collaborator.
//!
//! The weekly planner delegates its natural-language reasoning to an external
//! generative service. That call sits behind the `PlanningService` trait so
//! the deterministic composer can stand in for it (local mode, tests) and so
//! a failing remote never touches the store.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::domain::sites::Site;
use crate::domain::users::User;
use crate::domain::weekly_pm::WeekId;
use crate::planning::composer::{compose, ComposeContext, PlanSuggestion, SuggestedPm};
use crate::planning::PlanningError;

/// Planning input assembled by the caller from one store snapshot.
///
/// `last_scheduled` stays local to the deterministic composer; the external
/// service only ever sees the wire fields.
#[derive(Debug, Clone)]
pub struct PlanContext {
    pub overdue_sites: Vec<Site>,
    pub all_sites: Vec<Site>,
    pub technicians: Vec<User>,
    pub existing_week_site_ids: HashSet<Uuid>,
    pub last_scheduled: HashMap<Uuid, WeekId>,
    pub target_site_count: usize,
}

impl PlanContext {
    pub fn compose_ctx(&self) -> ComposeContext<'_> {
        ComposeContext {
            overdue: &self.overdue_sites,
            all_sites: &self.all_sites,
            scheduled_site_ids: &self.existing_week_site_ids,
            last_scheduled: &self.last_scheduled,
            target_site_count: self.target_site_count,
        }
    }
}

#[async_trait]
pub trait PlanningService: Send + Sync {
    /// Produce a suggested weekly plan. Must not mutate anything; the caller
    /// validates the result against the planning contract before use.
    async fn suggest(
        &self,
        ctx: &PlanContext,
        request_id: Option<&str>,
    ) -> Result<PlanSuggestion, PlanningError>;

    /// Liveness probe, used by the health endpoint and at startup.
    async fn health_check(&self) -> Result<(), PlanningError>;
}

/// Deterministic planner: the composer itself, no external call.
pub struct LocalPlanner;

#[async_trait]
impl PlanningService for LocalPlanner {
    async fn suggest(
        &self,
        ctx: &PlanContext,
        _request_id: Option<&str>,
    ) -> Result<PlanSuggestion, PlanningError> {
        Ok(compose(&ctx.compose_ctx()))
    }

    async fn health_check(&self) -> Result<(), PlanningError> {
        Ok(())
    }
}

// =============================================================================
// Remote planner
// =============================================================================

/// Wire shapes for the external reasoning service. Field names follow the
/// service's own schema, hence the camelCase renames.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WirePlanRequest<'a> {
    overdue_sites: &'a [Site],
    all_sites: &'a [Site],
    technicians: Vec<WireTechnician<'a>>,
    #[serde(rename = "existingPMsForWeek")]
    existing_pms_for_week: Vec<WireExistingPm>,
    target_site_count: usize,
}

#[derive(Debug, Serialize)]
struct WireTechnician<'a> {
    id: Uuid,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireExistingPm {
    site_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct WirePlanResponse {
    #[serde(rename = "suggestedPMs")]
    suggested_pms: Vec<WireSuggestedPm>,
    reasoning: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSuggestedPm {
    site_id: Uuid,
    #[serde(default)]
    technician_id: Option<Uuid>,
}

/// Error body the service returns on failure.
#[derive(Debug, Deserialize)]
struct WireErrorResponse {
    message: String,
}

/// Client for the external reasoning service.
#[derive(Clone)]
pub struct RemotePlanner {
    client: Client,
    base_url: String,
    token: String,
}

impl RemotePlanner {
    /// The request timeout bounds the unbounded external latency; on expiry
    /// the call fails as `PlanningError::Unavailable` and is not retried.
    pub fn new(base_url: &str, token: &str, timeout_seconds: u64) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(base_url = base_url, "Remote planner initialized");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl PlanningService for RemotePlanner {
    #[instrument(skip(self, ctx))]
    async fn suggest(
        &self,
        ctx: &PlanContext,
        request_id: Option<&str>,
    ) -> Result<PlanSuggestion, PlanningError> {
        let body = WirePlanRequest {
            overdue_sites: &ctx.overdue_sites,
            all_sites: &ctx.all_sites,
            technicians: ctx
                .technicians
                .iter()
                .map(|t| WireTechnician {
                    id: t.id,
                    name: &t.name,
                })
                .collect(),
            existing_pms_for_week: ctx
                .existing_week_site_ids
                .iter()
                .map(|&site_id| WireExistingPm { site_id })
                .collect(),
            target_site_count: ctx.target_site_count,
        };

        let url = format!("{}/v1/plan/suggest", self.base_url);
        debug!(url = %url, target = ctx.target_site_count, "Planning service request");

        let mut req = self
            .client
            .post(&url)
            .header("X-Internal-Token", &self.token)
            .header("Content-Type", "application/json");
        if let Some(rid) = request_id {
            req = req.header("x-request-id", rid);
        }

        let response = req.json(&body).send().await.map_err(|e| {
            error!(error = %e, "Planning service request failed");
            PlanningError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<WireErrorResponse>()
                .await
                .map(|e| e.message)
                .unwrap_or_else(|_| format!("planning service returned {status}"));
            error!(status = %status, message = %message, "Planning service error");
            return Err(PlanningError::Unavailable(message));
        }

        // Schema validation of the response body is mandatory before use.
        let wire: WirePlanResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse planning service response");
            PlanningError::InvalidResponse(e.to_string())
        })?;

        Ok(PlanSuggestion {
            suggested_pms: wire
                .suggested_pms
                .into_iter()
                .map(|pm| SuggestedPm {
                    site_id: pm.site_id,
                    technician_id: pm.technician_id,
                })
                .collect(),
            reasoning: wire.reasoning,
        })
    }

    async fn health_check(&self) -> Result<(), PlanningError> {
        let url = format!("{}/health", self.base_url);

        self.client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| PlanningError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| PlanningError::Unavailable(e.to_string()))?;

        Ok(())
    }
}
