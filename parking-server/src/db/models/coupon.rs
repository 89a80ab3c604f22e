//! Coupon Models

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Coupon kind enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponKind {
    Percentage,
    FixedAmount,
}

/// Coupon entity
///
/// `name` 同时作为兑换码使用 (大小写不敏感匹配)。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    pub kind: CouponKind,
    pub value: f64,
    #[serde(default)]
    pub description: String,
    /// Validity start date (YYYY-MM-DD), inclusive
    pub valid_from: String,
    /// Validity end date (YYYY-MM-DD), inclusive
    pub valid_until: String,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Create coupon payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponCreate {
    pub name: String,
    pub kind: CouponKind,
    pub value: f64,
    pub description: Option<String>,
    pub valid_from: String,
    pub valid_until: String,
    pub is_active: Option<bool>,
}

/// Update coupon payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<CouponKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Applied coupon record (discount trace attached to one payment)
///
/// 金额在应用时落库，之后不可变 - 不支持事后重算。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedCoupon {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub payment: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub coupon: RecordId,
    pub discounted_amount: f64,
}
