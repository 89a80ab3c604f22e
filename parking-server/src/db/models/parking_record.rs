//! Parking Record Model (occupancy ledger)

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// One parking session of a vehicle in a space
///
/// `exited_at` 为空表示车辆仍在场内。记录在进场时创建，
/// 出场时仅写入一次 `exited_at`，流程不删除记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingRecord {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub vehicle: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub space: RecordId,
    /// Entry timestamp (Unix millis), set at creation
    pub entered_at: i64,
    /// Exit timestamp (Unix millis), absent while the vehicle is parked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exited_at: Option<i64>,
}

impl ParkingRecord {
    /// Whether the session is still open
    pub fn is_open(&self) -> bool {
        self.exited_at.is_none()
    }
}
