//! Maintenance task catalog and per-PM task results
//!
//! The catalog is an immutable set of templates shared by every weekly PM.
//! Each WeeklyPM owns one `TaskResult` per catalog entry, created together
//! with the PM record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskFieldType {
    Checkbox,
    Text,
    Number,
    Photo,
}

/// One input field on a task form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskField {
    pub id: String,
    pub label: String,
    pub field_type: TaskFieldType,
}

/// Catalog template for a maintenance task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub kind: TaskKind,
    /// Ordered; rendering follows this order.
    pub fields: Vec<TaskField>,
}

/// GPS fix captured by the technician on site.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Outcome of one catalog task within a weekly PM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: Uuid,
    pub is_completed: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// field-id -> checked, for checkbox fields
    #[serde(default)]
    pub checklist: BTreeMap<String, bool>,
    /// field-id -> value, for text/number fields
    #[serde(default)]
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

impl TaskResult {
    /// Fresh result for a newly created PM: nothing filled in yet.
    pub fn blank_for(template: &TaskTemplate) -> Self {
        Self {
            task_id: template.id,
            is_completed: false,
            notes: String::new(),
            photos: Vec::new(),
            location: None,
            checklist: BTreeMap::new(),
            custom_fields: BTreeMap::new(),
        }
    }
}

/// Patch DTO for a technician updating one task result.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskResultPatch {
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photos: Option<Vec<String>>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub checklist: Option<BTreeMap<String, bool>>,
    #[serde(default)]
    pub custom_fields: Option<BTreeMap<String, serde_json::Value>>,
}

/// Built-in catalog used when no seed file provides one.
pub fn default_catalog() -> Vec<TaskTemplate> {
    fn checkbox(id: &str, label: &str) -> TaskField {
        TaskField {
            id: id.to_string(),
            label: label.to_string(),
            field_type: TaskFieldType::Checkbox,
        }
    }
    fn number(id: &str, label: &str) -> TaskField {
        TaskField {
            id: id.to_string(),
            label: label.to_string(),
            field_type: TaskFieldType::Number,
        }
    }
    fn text(id: &str, label: &str) -> TaskField {
        TaskField {
            id: id.to_string(),
            label: label.to_string(),
            field_type: TaskFieldType::Text,
        }
    }
    fn photo(id: &str, label: &str) -> TaskField {
        TaskField {
            id: id.to_string(),
            label: label.to_string(),
            field_type: TaskFieldType::Photo,
        }
    }

    vec![
        TaskTemplate {
            id: Uuid::new_v4(),
            title: "Power system check".to_string(),
            description: "Rectifier, batteries and AC feed.".to_string(),
            kind: TaskKind::Static,
            fields: vec![
                number("rectifier_voltage", "Rectifier output voltage (V)"),
                number("battery_voltage", "Battery string voltage (V)"),
                checkbox("ac_feed_ok", "AC feed within tolerance"),
                photo("power_room_photo", "Power room photo"),
            ],
        },
        TaskTemplate {
            id: Uuid::new_v4(),
            title: "Generator inspection".to_string(),
            description: "Fuel level, oil and test run.".to_string(),
            kind: TaskKind::Static,
            fields: vec![
                number("fuel_level_percent", "Fuel level (%)"),
                checkbox("oil_level_ok", "Oil level OK"),
                checkbox("test_run_ok", "Test run successful"),
            ],
        },
        TaskTemplate {
            id: Uuid::new_v4(),
            title: "Antenna and feeder inspection".to_string(),
            description: "Visual check of mast, antennas and feeder runs.".to_string(),
            kind: TaskKind::Static,
            fields: vec![
                checkbox("feeders_secured", "Feeders secured and undamaged"),
                checkbox("mast_lights_ok", "Mast obstruction lights working"),
                photo("mast_photo", "Mast photo"),
            ],
        },
        TaskTemplate {
            id: Uuid::new_v4(),
            title: "Site housekeeping".to_string(),
            description: "Shelter condition, locks, alarms and grounds.".to_string(),
            kind: TaskKind::Dynamic,
            fields: vec![
                checkbox("shelter_clean", "Shelter clean and dry"),
                checkbox("locks_ok", "Locks and fencing intact"),
                text("issues_found", "Issues found on site"),
            ],
        },
    ]
}
