//! Payment Repository

use super::{BaseRepository, CountRow, RepoError, RepoResult, SumRow};
use crate::db::models::serde_helpers;
use crate::db::models::{Payment, PaymentMethod, PaymentStatus};
use serde::{Deserialize, Serialize};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "payment";

/// Listing cap
const LIST_LIMIT: usize = 200;

/// Payment row joined with the vehicle plate for listings
///
/// 关联字段可能为 null (车辆事后被删除)。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDetail {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    #[serde(with = "serde_helpers::record_id")]
    pub record: RecordId,
    pub paid_at: i64,
    #[serde(default)]
    pub plate: Option<String>,
}

/// Payment row joined with the floor of the billed space (report aggregation)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentFloorRow {
    pub amount: f64,
    pub paid_at: i64,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub floor: Option<RecordId>,
}

#[derive(Clone)]
pub struct PaymentRepository {
    base: BaseRepository,
}

impl PaymentRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Record a charge for a closed parking session
    pub async fn create(
        &self,
        amount: f64,
        method: PaymentMethod,
        status: PaymentStatus,
        record: RecordId,
        paid_at: i64,
    ) -> RepoResult<Payment> {
        let created: Vec<Payment> = self
            .base
            .db()
            .query(format!(
                "CREATE {TABLE} SET amount = $amount, method = $method, status = $status, \
                 record = $record, paid_at = $paid_at"
            ))
            .bind(("amount", amount))
            .bind(("method", method))
            .bind(("status", status))
            .bind(("record", record))
            .bind(("paid_at", paid_at))
            .await?
            .take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create payment".to_string()))
    }

    /// Find payment by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Payment>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let payment: Option<Payment> = self.base.db().select(thing).await?;
        Ok(payment)
    }

    /// Payments listing with optional status filter and plate search, newest first
    pub async fn find_filtered(
        &self,
        status: Option<PaymentStatus>,
        q: Option<String>,
    ) -> RepoResult<Vec<PaymentDetail>> {
        let mut query = format!("SELECT *, record.vehicle.plate AS plate FROM {TABLE}");
        let mut conditions: Vec<&str> = Vec::new();
        if status.is_some() {
            conditions.push("status = $status");
        }
        if q.is_some() {
            conditions.push("record.vehicle.plate CONTAINS $q");
        }
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        query.push_str(&format!(" ORDER BY paid_at DESC LIMIT {LIST_LIMIT}"));

        let mut request = self.base.db().query(query);
        if let Some(s) = status {
            request = request.bind(("status", s));
        }
        if let Some(text) = q {
            request = request.bind(("q", text.to_uppercase()));
        }
        let payments: Vec<PaymentDetail> = request.await?.take(0)?;
        Ok(payments)
    }

    /// Payments of a set of records (inventory listing join)
    pub async fn find_by_records(&self, records: Vec<RecordId>) -> RepoResult<Vec<Payment>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let payments: Vec<Payment> = self
            .base
            .db()
            .query("SELECT * FROM payment WHERE record IN $records")
            .bind(("records", records))
            .await?
            .take(0)?;
        Ok(payments)
    }

    /// Settle a PENDING cash payment
    ///
    /// 条件更新：只有 PENDING 状态会被置为 PAID。
    pub async fn settle(&self, id: &str) -> RepoResult<Payment> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let updated: Vec<Payment> = self
            .base
            .db()
            .query("UPDATE $thing SET status = $next WHERE status = $expected RETURN AFTER")
            .bind(("thing", thing))
            .bind(("next", PaymentStatus::Paid))
            .bind(("expected", PaymentStatus::Pending))
            .await?
            .take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Validation(format!("Payment {} is not pending", id)))
    }

    /// Sum of PAID amounts over all time
    pub async fn sum_paid_total(&self) -> RepoResult<f64> {
        let row: Option<SumRow> = self
            .base
            .db()
            .query("SELECT math::sum(amount) AS total FROM payment WHERE status = $status GROUP ALL")
            .bind(("status", PaymentStatus::Paid))
            .await?
            .take(0)?;
        Ok(row.map(|r| r.total).unwrap_or(0.0))
    }

    /// Sum of PAID amounts inside [start, end)
    pub async fn sum_paid_between(&self, start: i64, end: i64) -> RepoResult<f64> {
        let row: Option<SumRow> = self
            .base
            .db()
            .query(
                "SELECT math::sum(amount) AS total FROM payment \
                 WHERE status = $status AND paid_at >= $start AND paid_at < $end GROUP ALL",
            )
            .bind(("status", PaymentStatus::Paid))
            .bind(("start", start))
            .bind(("end", end))
            .await?
            .take(0)?;
        Ok(row.map(|r| r.total).unwrap_or(0.0))
    }

    /// PAID rows with floor reference inside [start, end) (report aggregation)
    pub async fn paid_rows_with_floor_between(
        &self,
        start: i64,
        end: i64,
    ) -> RepoResult<Vec<PaymentFloorRow>> {
        let rows: Vec<PaymentFloorRow> = self
            .base
            .db()
            .query(
                "SELECT amount, paid_at, record.space.floor AS floor FROM payment \
                 WHERE status = $status AND paid_at >= $start AND paid_at < $end",
            )
            .bind(("status", PaymentStatus::Paid))
            .bind(("start", start))
            .bind(("end", end))
            .await?
            .take(0)?;
        Ok(rows)
    }

    /// Count payments in one status
    pub async fn count_status(&self, status: PaymentStatus) -> RepoResult<i64> {
        let row: Option<CountRow> = self
            .base
            .db()
            .query("SELECT count() AS count FROM payment WHERE status = $status GROUP ALL")
            .bind(("status", status))
            .await?
            .take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }
}
