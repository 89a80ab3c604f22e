//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 认证相关接口
//! - [`users`] - 账户管理接口
//! - [`floors`] - 楼层管理接口
//! - [`space_types`] - 车位类型管理接口
//! - [`spaces`] - 车位管理接口
//! - [`vehicles`] - 车辆管理接口
//! - [`tariffs`] - 费率管理接口
//! - [`coupons`] - 优惠券管理接口
//! - [`sessions`] - 进出场与台账接口
//! - [`payments`] - 支付接口
//! - [`reservations`] - 预约接口
//! - [`reports`] - 仪表盘与报表接口

pub mod auth;
pub mod health;
pub mod users;

// Inventory API
pub mod floors;
pub mod space_types;
pub mod spaces;
pub mod vehicles;

// Billing API
pub mod coupons;
pub mod payments;
pub mod tariffs;

// Occupancy API
pub mod reports;
pub mod reservations;
pub mod sessions;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};
