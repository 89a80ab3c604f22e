//! Discount Applier
//!
//! Applies a coupon to a computed fee. Discounts are bounded so they can
//! never invert the sign of the amount: fixed coupons cap at the fee,
//! the final amount floors at zero.

use rust_decimal::prelude::*;

use crate::db::models::{Coupon, CouponKind};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

#[inline]
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

#[inline]
fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Whether a coupon can be redeemed on a given date
///
/// 有效期两端 inclusive；日期为 YYYY-MM-DD 字符串，字典序即日期序。
pub fn is_eligible(coupon: &Coupon, today: &str) -> bool {
    coupon.is_active && coupon.valid_from.as_str() <= today && today <= coupon.valid_until.as_str()
}

/// Discount amount a coupon yields against a fee
///
/// Percentage: fee × value / 100. Fixed: min(value, fee).
pub fn discount_for(coupon: &Coupon, fee: f64) -> f64 {
    let fee_d = to_decimal(fee);
    let value = to_decimal(coupon.value);
    let discount = match coupon.kind {
        CouponKind::Percentage => fee_d * value / Decimal::ONE_HUNDRED,
        CouponKind::FixedAmount => value.min(fee_d),
    };
    to_f64(discount)
}

/// Final amount after a discount: max(fee − discount, 0)
pub fn apply(fee: f64, discount: f64) -> f64 {
    to_f64((to_decimal(fee) - to_decimal(discount)).max(Decimal::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_coupon(kind: CouponKind, value: f64, active: bool) -> Coupon {
        Coupon {
            id: None,
            name: "TEST".to_string(),
            kind,
            value,
            description: String::new(),
            valid_from: "2025-01-01".to_string(),
            valid_until: "2025-12-31".to_string(),
            is_active: active,
        }
    }

    #[test]
    fn test_percentage_discount() {
        // fee 50000, 20% → discount 10000, final 40000
        let coupon = make_coupon(CouponKind::Percentage, 20.0, true);
        let discount = discount_for(&coupon, 50000.0);
        assert_eq!(discount, 10000.0);
        assert_eq!(apply(50000.0, discount), 40000.0);
    }

    #[test]
    fn test_fixed_discount_caps_at_fee() {
        // fee 5000, fixed 8000 → discount capped at 5000, final 0
        let coupon = make_coupon(CouponKind::FixedAmount, 8000.0, true);
        let discount = discount_for(&coupon, 5000.0);
        assert_eq!(discount, 5000.0);
        assert_eq!(apply(5000.0, discount), 0.0);
    }

    #[test]
    fn test_fixed_discount_below_fee() {
        let coupon = make_coupon(CouponKind::FixedAmount, 2000.0, true);
        let discount = discount_for(&coupon, 5000.0);
        assert_eq!(discount, 2000.0);
        assert_eq!(apply(5000.0, discount), 3000.0);
    }

    #[test]
    fn test_final_amount_never_negative() {
        assert_eq!(apply(100.0, 250.0), 0.0);
    }

    #[test]
    fn test_eligibility_window_inclusive() {
        let coupon = make_coupon(CouponKind::Percentage, 10.0, true);
        assert!(is_eligible(&coupon, "2025-01-01"));
        assert!(is_eligible(&coupon, "2025-06-15"));
        assert!(is_eligible(&coupon, "2025-12-31"));
        assert!(!is_eligible(&coupon, "2024-12-31"));
        assert!(!is_eligible(&coupon, "2026-01-01"));
    }

    #[test]
    fn test_inactive_coupon_not_eligible() {
        let coupon = make_coupon(CouponKind::Percentage, 10.0, false);
        assert!(!is_eligible(&coupon, "2025-06-15"));
    }

    #[test]
    fn test_percentage_rounding_half_up() {
        // 33% of 100.50 = 33.165 → 33.17
        let coupon = make_coupon(CouponKind::Percentage, 33.0, true);
        assert_eq!(discount_for(&coupon, 100.50), 33.17);
    }
}
