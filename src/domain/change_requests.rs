//! Change request domain types
//!
//! CRs are raised against a site independently of the weekly PM cycle. The
//! status/priority/kind labels are the Persian strings used by the field
//! organisation; they are preserved verbatim on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CrKind {
    #[serde(rename = "برای PM")]
    Pm,
    #[serde(rename = "برای رفع خرابی")]
    FaultRepair,
    #[serde(rename = "برای بازدید در موارد خاص")]
    SpecialVisit,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CrStatus {
    #[serde(rename = "باز")]
    Open,
    #[serde(rename = "در حال انجام")]
    InProgress,
    #[serde(rename = "انجام شده")]
    Done,
    #[serde(rename = "رد شده")]
    Rejected,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CrPriority {
    #[serde(rename = "کم")]
    Low,
    #[serde(rename = "متوسط")]
    Medium,
    #[serde(rename = "زیاد")]
    High,
    #[serde(rename = "بحرانی")]
    Critical,
}

/// Change request entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub id: Uuid,
    pub site_id: Uuid,
    pub kind: CrKind,
    pub description: String,
    pub submitted_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: CrStatus,
    pub priority: CrPriority,
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Request DTO for creating a change request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateChangeRequestRequest {
    pub site_id: Uuid,
    pub kind: CrKind,
    pub description: String,
    pub priority: CrPriority,
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Request DTO for a manager updating status/priority
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateChangeRequestRequest {
    #[serde(default)]
    pub status: Option<CrStatus>,
    #[serde(default)]
    pub priority: Option<CrPriority>,
}
