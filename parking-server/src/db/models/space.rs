//! Space Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Space status enum
///
/// AVAILABLE ⇄ OCCUPIED 由进出场流程驱动，
/// INACTIVE 是管理员设置的行政状态，不参与流程。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpaceStatus {
    Available,
    Occupied,
    Inactive,
}

impl SpaceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceStatus::Available => "AVAILABLE",
            SpaceStatus::Occupied => "OCCUPIED",
            SpaceStatus::Inactive => "INACTIVE",
        }
    }
}

/// Space entity (单个车位，属于一个楼层和一个类型)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub number: String,
    /// Floor reference
    #[serde(with = "serde_helpers::record_id")]
    pub floor: RecordId,
    /// Space type reference
    #[serde(with = "serde_helpers::record_id")]
    pub space_type: RecordId,
    #[serde(default = "default_status")]
    pub status: SpaceStatus,
}

fn default_status() -> SpaceStatus {
    SpaceStatus::Available
}

/// Create space payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceCreate {
    pub number: String,
    #[serde(with = "serde_helpers::record_id")]
    pub floor: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub space_type: RecordId,
    pub status: Option<SpaceStatus>,
}

/// Update space payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub floor: Option<RecordId>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub space_type: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SpaceStatus>,
}

/// Bulk range creation payload (例: A-01 到 A-20)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceRangeCreate {
    pub prefix: String,
    pub start: u32,
    pub end: u32,
    #[serde(with = "serde_helpers::record_id")]
    pub floor: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub space_type: RecordId,
}
