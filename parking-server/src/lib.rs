//! Parking Server - 停车场管理服务端
//!
//! # 架构概述
//!
//! 提供以下核心功能：
//!
//! - **车位登记** (`db`): 楼层/类型/车位库存，嵌入式 SurrealDB 存储
//! - **进出场** (`sessions`): 占用台账、条件更新消除双重出场竞态
//! - **计费** (`billing`): 整点向上取整计费 + 优惠券折扣
//! - **认证** (`auth`): JWT + Argon2 认证体系
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! parking-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证、角色
//! ├── api/           # HTTP 路由和处理器
//! ├── billing/       # 费用计算、折扣
//! ├── sessions/      # 进出场流程
//! ├── db/            # 数据库层
//! └── utils/         # 工具函数
//! ```

pub mod api;
pub mod auth;
pub mod billing;
pub mod core;
pub mod db;
pub mod sessions;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use sessions::SessionManager;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置进程环境 (dotenv + 日志)
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ____             __   _
   / __ \____ ______/ /__(_)___  ____ _
  / /_/ / __ `/ ___/ //_/ / __ \/ __ `/
 / ____/ /_/ / /  / ,< / / / / / /_/ /
/_/    \__,_/_/  /_/|_/_/_/ /_/\__, /
                              /____/
    "#
    );
}
