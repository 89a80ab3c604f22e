//! Repository Module
//!
//! Provides CRUD operations for SurrealDB tables.

// Accounts
pub mod user_account;

// Inventory
pub mod floor;
pub mod space;
pub mod space_type;
pub mod vehicle;

// Billing
pub mod coupon;
pub mod payment;
pub mod tariff;

// Occupancy
pub mod parking_record;
pub mod reservation;

// Re-exports
pub use coupon::CouponRepository;
pub use floor::FloorRepository;
pub use parking_record::ParkingRecordRepository;
pub use payment::PaymentRepository;
pub use reservation::ReservationRepository;
pub use space::SpaceRepository;
pub use space_type::SpaceTypeRepository;
pub use tariff::TariffRepository;
pub use user_account::UserAccountRepository;
pub use vehicle::VehicleRepository;

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: 全栈统一使用 "table:id" 格式
// =============================================================================
//
// 使用 surrealdb::RecordId 处理所有 ID：
//   - 解析: let id: RecordId = "space:abc".parse()?;
//   - 获取纯ID: id.key().to_string()
//   - CRUD: db.select(id) / db.delete(id) 直接使用 RecordId

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

/// Row shape of `SELECT count() AS count ... GROUP ALL`
#[derive(Debug, Deserialize)]
pub(crate) struct CountRow {
    pub count: i64,
}

/// Row shape of `SELECT math::sum(x) AS total ... GROUP ALL`
#[derive(Debug, Deserialize)]
pub(crate) struct SumRow {
    pub total: f64,
}
