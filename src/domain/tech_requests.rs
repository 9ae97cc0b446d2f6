//! Technician request domain types
//!
//! Technician-initiated requests to management: equipment orders, issue
//! reports and suggestions. Independent of the weekly PM cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::weekly_pm::Comment;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TechRequestKind {
    Equipment,
    Issue,
    Suggestion,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TechRequestPriority {
    Urgent,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TechRequestStatus {
    New,
    InReview,
    Done,
    Rejected,
}

/// One line of an equipment order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub name: String,
    pub quantity: u32,
}

/// Tech request entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechRequest {
    pub id: Uuid,
    pub technician_id: Uuid,
    pub title: String,
    pub kind: TechRequestKind,
    pub priority: TechRequestPriority,
    /// Present for issue/suggestion requests.
    #[serde(default)]
    pub description: Option<String>,
    /// Present for equipment requests.
    #[serde(default)]
    pub equipment: Vec<EquipmentItem>,
    pub status: TechRequestStatus,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for a technician creating a request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTechRequestRequest {
    pub title: String,
    pub kind: TechRequestKind,
    pub priority: TechRequestPriority,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub equipment: Vec<EquipmentItem>,
}

/// Request DTO for a manager updating the status
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTechRequestRequest {
    pub status: TechRequestStatus,
}
