//! Fee Calculator
//!
//! Converts elapsed parking time into billable hours and a monetary amount.
//! Uses rust_decimal for precise calculations, stores as f64.
//!
//! 计费规则：不足一小时按一小时计 (向上取整)，最低消费一小时。

use rust_decimal::prelude::*;
use serde::Serialize;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

const MILLIS_PER_MINUTE: i64 = 60 * 1000;
const MINUTES_PER_HOUR: i64 = 60;
const HOURS_PER_DAY: i64 = 24;

/// Convert f64 to Decimal for calculation
#[inline]
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Elapsed wall-clock duration decomposed for billing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElapsedBreakdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl ElapsedBreakdown {
    /// Decompose the span between two Unix-millis timestamps
    ///
    /// Negative spans clamp to zero (clock skew on the caller's side).
    pub fn between(entered_at: i64, exited_at: i64) -> Self {
        let total_minutes = (exited_at - entered_at).max(0) / MILLIS_PER_MINUTE;
        let days = total_minutes / (HOURS_PER_DAY * MINUTES_PER_HOUR);
        let rem = total_minutes % (HOURS_PER_DAY * MINUTES_PER_HOUR);
        Self {
            days,
            hours: rem / MINUTES_PER_HOUR,
            minutes: rem % MINUTES_PER_HOUR,
        }
    }

    /// Billable hours: every full day counts 24, any leftover minutes round
    /// up to one more hour, and the total never drops below 1.
    pub fn billable_hours(&self) -> i64 {
        let total = self.days * HOURS_PER_DAY
            + self.hours
            + if self.minutes > 0 { 1 } else { 0 };
        if total == 0 { 1 } else { total }
    }

    /// Human-readable duration, e.g. "2d 3h 15m"
    pub fn display(&self) -> String {
        let mut out = String::new();
        if self.days > 0 {
            out.push_str(&format!("{}d ", self.days));
        }
        if self.hours > 0 {
            out.push_str(&format!("{}h ", self.hours));
        }
        out.push_str(&format!("{}m", self.minutes));
        out
    }
}

/// Result of a fee calculation
#[derive(Debug, Clone, Serialize)]
pub struct FeeQuote {
    pub elapsed: ElapsedBreakdown,
    pub billable_hours: i64,
    pub hourly_price: f64,
    pub amount: f64,
}

/// Quote the fee for a parking span at an hourly price
pub fn quote(entered_at: i64, exited_at: i64, hourly_price: f64) -> FeeQuote {
    let elapsed = ElapsedBreakdown::between(entered_at, exited_at);
    let billable_hours = elapsed.billable_hours();
    let amount = to_f64(to_decimal(hourly_price) * Decimal::from(billable_hours));
    FeeQuote {
        elapsed,
        billable_hours,
        hourly_price,
        amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: i64 = MILLIS_PER_MINUTE;
    const HOUR: i64 = 60 * MIN;
    const DAY: i64 = 24 * HOUR;

    #[test]
    fn test_five_minutes_bills_one_hour() {
        // entry 10:00, exit 10:05, hourly 5000 → 1 hour → 5000
        let q = quote(0, 5 * MIN, 5000.0);
        assert_eq!(q.billable_hours, 1);
        assert_eq!(q.amount, 5000.0);
    }

    #[test]
    fn test_zero_elapsed_still_bills_one_hour() {
        let q = quote(1000, 1000, 3000.0);
        assert_eq!(q.billable_hours, 1);
        assert_eq!(q.amount, 3000.0);
    }

    #[test]
    fn test_exact_hours_do_not_round_up() {
        let q = quote(0, 2 * HOUR, 2000.0);
        assert_eq!(q.billable_hours, 2);
        assert_eq!(q.amount, 4000.0);
    }

    #[test]
    fn test_multi_day_with_remainder() {
        // 59h30m → days=2, hours=11, minutes=30 → 2*24+11+1 = 60 → 120000
        let span = 2 * DAY + 11 * HOUR + 30 * MIN;
        let elapsed = ElapsedBreakdown::between(0, span);
        assert_eq!(elapsed.days, 2);
        assert_eq!(elapsed.hours, 11);
        assert_eq!(elapsed.minutes, 30);

        let q = quote(0, span, 2000.0);
        assert_eq!(q.billable_hours, 60);
        assert_eq!(q.amount, 120000.0);
    }

    #[test]
    fn test_sub_minute_remainder_counts_as_zero_minutes() {
        // 1h + 30s rounds down to 1h0m → 1 billable hour
        let q = quote(0, HOUR + 30 * 1000, 1500.0);
        assert_eq!(q.elapsed.minutes, 0);
        assert_eq!(q.billable_hours, 1);
        assert_eq!(q.amount, 1500.0);
    }

    #[test]
    fn test_negative_span_clamps_to_minimum_charge() {
        let q = quote(10_000, 0, 5000.0);
        assert_eq!(q.billable_hours, 1);
        assert_eq!(q.amount, 5000.0);
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(ElapsedBreakdown::between(0, 5 * MIN).display(), "5m");
        assert_eq!(
            ElapsedBreakdown::between(0, HOUR + 5 * MIN).display(),
            "1h 5m"
        );
        assert_eq!(
            ElapsedBreakdown::between(0, DAY + 2 * HOUR + 1 * MIN).display(),
            "1d 2h 1m"
        );
        assert_eq!(ElapsedBreakdown::between(0, 30 * 1000).display(), "0m");
    }

    #[test]
    fn test_fractional_hourly_price_rounds_half_up() {
        // 3 hours at 1000.005 → 3000.015 → 3000.02
        let q = quote(0, 3 * HOUR, 1000.005);
        assert_eq!(q.amount, 3000.02);
    }
}
