//! Tariff Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Tariff entity (rate card for a space type)
///
/// 同一类型同一时刻至多一个 active 费率 - 写入时强制。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tariff {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    /// Space type reference
    #[serde(with = "serde_helpers::record_id")]
    pub space_type: RecordId,
    pub hourly_price: f64,
    pub daily_price: f64,
    pub monthly_price: f64,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
    /// Validity start date (YYYY-MM-DD)
    pub valid_from: String,
    /// Validity end date (YYYY-MM-DD), open-ended when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Create tariff payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffCreate {
    pub name: String,
    #[serde(with = "serde_helpers::record_id")]
    pub space_type: RecordId,
    pub hourly_price: f64,
    pub daily_price: f64,
    pub monthly_price: f64,
    pub is_active: Option<bool>,
    pub valid_from: String,
    pub valid_until: Option<String>,
}

/// Update tariff payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub space_type: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
}
