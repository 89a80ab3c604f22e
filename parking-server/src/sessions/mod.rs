//! 停车会话模块
//!
//! 进出场流程 (check-in / check-out / 在场估价)。

pub mod manager;

#[cfg(test)]
mod tests;

pub use manager::{
    CheckInOutcome, CheckInRequest, CheckOutOutcome, CheckOutTarget, OccupancyDetail,
    SessionManager,
};
