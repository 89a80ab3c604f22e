//! Payment Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Payment method enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Pse,
}

/// Payment status enum
///
/// 现金在出场时登记为 PENDING，到收银台结清后转 PAID。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Void,
}

/// Payment entity (one charge for one parking record)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Parking record reference
    #[serde(with = "serde_helpers::record_id")]
    pub record: RecordId,
    /// Creation timestamp (Unix millis)
    pub paid_at: i64,
}
