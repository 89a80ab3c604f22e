//! Database Module
//!
//! 嵌入式 SurrealDB (RocksDB 引擎)。schema 在启动时应用：
//! 表 + 唯一索引 (车牌、邮箱、证件号、车位类型名)。

pub mod models;
pub mod repository;

use crate::utils::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

const NAMESPACE: &str = "parking";
const DATABASE: &str = "parking";

/// Startup schema: tables are schemaless, uniqueness lives in indexes
const SCHEMA: &str = "
DEFINE INDEX IF NOT EXISTS uniq_vehicle_plate ON TABLE vehicle COLUMNS plate UNIQUE;
DEFINE INDEX IF NOT EXISTS uniq_account_email ON TABLE user_account COLUMNS email UNIQUE;
DEFINE INDEX IF NOT EXISTS uniq_account_document ON TABLE user_account COLUMNS document UNIQUE;
DEFINE INDEX IF NOT EXISTS uniq_space_type_name ON TABLE space_type COLUMNS name UNIQUE;
DEFINE INDEX IF NOT EXISTS idx_record_space ON TABLE parking_record COLUMNS space;
DEFINE INDEX IF NOT EXISTS idx_record_entered ON TABLE parking_record COLUMNS entered_at;
DEFINE INDEX IF NOT EXISTS idx_payment_paid_at ON TABLE payment COLUMNS paid_at;
";

/// Database service - owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open the on-disk database and apply the schema
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {}", e)))?;

        Self::prepare(&db).await?;
        tracing::info!("Database ready at {}", db_path);
        Ok(Self { db })
    }

    /// Open an in-memory database (tests)
    pub async fn memory() -> Result<Self, AppError> {
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::database(format!("Failed to open in-memory database: {}", e)))?;

        Self::prepare(&db).await?;
        Ok(Self { db })
    }

    async fn prepare(db: &Surreal<Db>) -> Result<(), AppError> {
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {}", e)))?;

        db.query(SCHEMA)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply schema: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_on_disk_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("parking.db");

        let service = DbService::new(&path.to_string_lossy())
            .await
            .expect("open on-disk db");
        service
            .db
            .query("CREATE floor SET name = 'L1', is_active = true")
            .await
            .expect("write");
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let service = DbService::memory().await.expect("in-memory db");
        // Re-applying the schema must not fail (server restarts)
        DbService::prepare(&service.db).await.expect("re-apply");
    }
}
