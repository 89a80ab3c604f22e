//! 认证模块
//!
//! JWT + Argon2 认证体系：
//! - [`jwt`] - 令牌服务与 [`CurrentUser`] 请求上下文
//! - [`middleware`] - 认证与角色中间件
//! - [`extractor`] - handler 参数提取器

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth, require_staff};
