//! 计费模块
//!
//! - [`calculator`] - 时长分解、整点向上取整、费用计算
//! - [`discount`] - 优惠券资格与折扣计算

pub mod calculator;
pub mod discount;

pub use calculator::{ElapsedBreakdown, FeeQuote, quote};
