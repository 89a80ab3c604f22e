//! Space Type Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Space type entity (车位类型，驱动计费选择)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceType {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
}

/// Create space type payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceTypeCreate {
    pub name: String,
}

/// Update space type payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceTypeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
