//! Vehicle Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Vehicle kind enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleKind {
    Car,
    Motorcycle,
}

/// Vehicle entity
///
/// 车牌全局唯一 (存储为大写)。访客车辆 (`is_visitor`) 无关联账户，
/// 只记录联系人信息；注册车辆关联一个 `user_account`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub plate: String,
    #[serde(default = "default_kind")]
    pub kind: VehicleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
    /// Owner account reference (None for visitor vehicles)
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub owner: Option<RecordId>,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_visitor: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
}

fn default_kind() -> VehicleKind {
    VehicleKind::Car
}

fn default_true() -> bool {
    true
}

/// Create vehicle payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleCreate {
    pub plate: String,
    pub kind: Option<VehicleKind>,
    pub color: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub owner: Option<RecordId>,
    pub is_visitor: Option<bool>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
}

/// Update vehicle payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<VehicleKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub owner: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
}
