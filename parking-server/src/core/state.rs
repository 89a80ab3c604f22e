use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::db::models::{Role, UserAccountCreate};
use crate::db::repository::UserAccountRepository;
use crate::utils::{AppResult, time};

/// 服务器状态 - 持有所有服务的共享引用
///
/// ServerState 是服务端的核心数据结构。使用 Arc/克隆实现浅拷贝，
/// 所有权成本极低，每个 handler 拿到同一份数据库句柄。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (确保目录存在)
    /// 2. 数据库 (work_dir/database/parking.db)
    /// 3. 引导管理员账户 (无 ADMIN 账户时创建)
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        // 0. Ensure work_dir structure exists
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        // 1. Initialize DB
        let db_path = config.database_dir().join("parking.db");
        let db_path_str = db_path.to_string_lossy();

        let db_service = DbService::new(&db_path_str)
            .await
            .expect("Failed to initialize database");

        Self::with_db(config.clone(), db_service.db).await
    }

    /// 用已打开的数据库构造状态 (测试用内存引擎走这里)
    pub async fn with_db(config: Config, db: Surreal<Db>) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        let state = Self {
            config,
            db,
            jwt_service,
        };

        state
            .bootstrap_admin()
            .await
            .expect("Failed to bootstrap admin account");

        state
    }

    /// 无 ADMIN 账户时创建引导管理员
    async fn bootstrap_admin(&self) -> AppResult<()> {
        let repo = UserAccountRepository::new(self.db.clone());
        if repo.count_role(Role::Admin).await? > 0 {
            return Ok(());
        }

        repo.create(
            UserAccountCreate {
                document: "admin".to_string(),
                full_name: "Administrator".to_string(),
                email: self.config.admin_email.clone(),
                phone: None,
                password: self.config.admin_password.clone(),
                role: Some(Role::Admin),
            },
            time::now_millis(),
        )
        .await?;

        tracing::warn!(
            email = %self.config.admin_email,
            "Bootstrap admin account created - change the default password"
        );
        Ok(())
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 业务时区
    pub fn tz(&self) -> chrono_tz::Tz {
        self.config.tz()
    }
}
