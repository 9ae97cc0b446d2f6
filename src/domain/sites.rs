//! Telecom site domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Site entity
///
/// `technician_id` is a weak reference to the single responsible technician.
/// When set it must name a Technician-role user; that invariant is checked at
/// the create/update boundary, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: Uuid,
    pub name: String,
    /// "City, Region"
    pub location: String,
    pub image_url: Option<String>,
    pub image_hint: Option<String>,
    pub technician_id: Option<Uuid>,
}

/// Request DTO for creating a site
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSiteRequest {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_hint: Option<String>,
    #[serde(default)]
    pub technician_id: Option<Uuid>,
}

/// Request DTO for updating a site
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSiteRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_hint: Option<String>,
    /// `Some(None)` cannot be expressed here; clearing the technician goes
    /// through the dedicated unassign flag below.
    #[serde(default)]
    pub technician_id: Option<Uuid>,
    #[serde(default)]
    pub unassign_technician: bool,
}
