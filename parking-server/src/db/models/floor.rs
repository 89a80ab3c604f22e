//! Floor Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Floor entity (停车楼层)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Floor {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Create floor payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorCreate {
    pub name: String,
    pub is_active: Option<bool>,
}

/// Update floor payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}
