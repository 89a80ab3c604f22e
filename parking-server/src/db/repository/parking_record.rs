//! Parking Record Repository (occupancy ledger)
//!
//! 关单使用条件更新：`exited_at` 已写入的记录再次关单不命中，
//! 同一条记录不可能被出场两次 (双重计费竞态在存储层消除)。

use super::{BaseRepository, CountRow, RepoError, RepoResult};
use crate::db::models::ParkingRecord;
use crate::db::models::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "parking_record";

/// Inventory listing cap
const LIST_LIMIT: usize = 200;

/// Record row joined with plate and space number for listings
///
/// 关联字段可能为 null (车辆/车位事后被删除)。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingRecordDetail {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub vehicle: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub space: RecordId,
    pub entered_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exited_at: Option<i64>,
    #[serde(default)]
    pub plate: Option<String>,
    #[serde(default)]
    pub space_number: Option<String>,
}

/// Row used by usage-distribution reports
#[derive(Debug, Clone, Deserialize)]
pub struct UsageRow {
    #[serde(with = "serde_helpers::record_id")]
    pub vehicle: RecordId,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_visitor: bool,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub floor: Option<RecordId>,
}

#[derive(Clone)]
pub struct ParkingRecordRepository {
    base: BaseRepository,
}

impl ParkingRecordRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Open a new session at entry time
    pub async fn create(
        &self,
        vehicle: RecordId,
        space: RecordId,
        entered_at: i64,
    ) -> RepoResult<ParkingRecord> {
        let created: Vec<ParkingRecord> = self
            .base
            .db()
            .query(format!(
                "CREATE {TABLE} SET vehicle = $vehicle, space = $space, entered_at = $entered_at"
            ))
            .bind(("vehicle", vehicle))
            .bind(("space", space))
            .bind(("entered_at", entered_at))
            .await?
            .take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create parking record".to_string()))
    }

    /// Find record by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<ParkingRecord>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let record: Option<ParkingRecord> = self.base.db().select(thing).await?;
        Ok(record)
    }

    /// Find the open session on a space, if any
    pub async fn find_open_by_space(&self, space: &RecordId) -> RepoResult<Option<ParkingRecord>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM parking_record WHERE space = $space AND exited_at IS NONE LIMIT 1")
            .bind(("space", space.clone()))
            .await?;
        let records: Vec<ParkingRecord> = result.take(0)?;
        Ok(records.into_iter().next())
    }

    /// Find the open session of a vehicle, if any
    pub async fn find_open_by_vehicle(
        &self,
        vehicle: &RecordId,
    ) -> RepoResult<Option<ParkingRecord>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM parking_record WHERE vehicle = $vehicle AND exited_at IS NONE LIMIT 1")
            .bind(("vehicle", vehicle.clone()))
            .await?;
        let records: Vec<ParkingRecord> = result.take(0)?;
        Ok(records.into_iter().next())
    }

    /// Find the open session of any vehicle owned by an account, if any
    pub async fn find_open_by_owner(&self, owner: &RecordId) -> RepoResult<Option<ParkingRecord>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM parking_record WHERE exited_at IS NONE AND vehicle.owner = $owner LIMIT 1")
            .bind(("owner", owner.clone()))
            .await?;
        let records: Vec<ParkingRecord> = result.take(0)?;
        Ok(records.into_iter().next())
    }

    /// Close an open session
    ///
    /// 条件更新：记录已关时返回 None，调用方据此拒绝第二次出场。
    pub async fn close(&self, id: &RecordId, exited_at: i64) -> RepoResult<Option<ParkingRecord>> {
        let updated: Vec<ParkingRecord> = self
            .base
            .db()
            .query("UPDATE $thing SET exited_at = $exited_at WHERE exited_at IS NONE RETURN AFTER")
            .bind(("thing", id.clone()))
            .bind(("exited_at", exited_at))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Recent sessions with plate/space joined, newest first
    pub async fn find_recent(&self, q: Option<String>) -> RepoResult<Vec<ParkingRecordDetail>> {
        let records: Vec<ParkingRecordDetail> = match q {
            Some(text) => {
                self.base
                    .db()
                    .query(format!(
                        "SELECT *, vehicle.plate AS plate, space.number AS space_number FROM {TABLE} \
                         WHERE vehicle.plate CONTAINS $q OR space.number CONTAINS $q \
                         ORDER BY entered_at DESC LIMIT {LIST_LIMIT}"
                    ))
                    .bind(("q", text.to_uppercase()))
                    .await?
                    .take(0)?
            }
            None => {
                self.base
                    .db()
                    .query(format!(
                        "SELECT *, vehicle.plate AS plate, space.number AS space_number FROM {TABLE} \
                         ORDER BY entered_at DESC LIMIT {LIST_LIMIT}"
                    ))
                    .await?
                    .take(0)?
            }
        };
        Ok(records)
    }

    /// Count currently open sessions
    pub async fn count_open(&self) -> RepoResult<i64> {
        let row: Option<CountRow> = self
            .base
            .db()
            .query("SELECT count() AS count FROM parking_record WHERE exited_at IS NONE GROUP ALL")
            .await?
            .take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }

    /// Count total sessions ever recorded
    pub async fn count_all(&self) -> RepoResult<i64> {
        let row: Option<CountRow> = self
            .base
            .db()
            .query("SELECT count() AS count FROM parking_record GROUP ALL")
            .await?
            .take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }

    /// Count sessions closed inside [start, end)
    pub async fn count_exited_between(&self, start: i64, end: i64) -> RepoResult<i64> {
        let row: Option<CountRow> = self
            .base
            .db()
            .query("SELECT count() AS count FROM parking_record WHERE exited_at >= $start AND exited_at < $end GROUP ALL")
            .bind(("start", start))
            .bind(("end", end))
            .await?
            .take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }

    /// Count sessions opened inside [start, end)
    pub async fn count_entered_between(&self, start: i64, end: i64) -> RepoResult<i64> {
        let row: Option<CountRow> = self
            .base
            .db()
            .query("SELECT count() AS count FROM parking_record WHERE entered_at >= $start AND entered_at < $end GROUP ALL")
            .bind(("start", start))
            .bind(("end", end))
            .await?
            .take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }

    /// Sessions opened inside [start, end)
    pub async fn find_entered_between(&self, start: i64, end: i64) -> RepoResult<Vec<ParkingRecord>> {
        let records: Vec<ParkingRecord> = self
            .base
            .db()
            .query("SELECT * FROM parking_record WHERE entered_at >= $start AND entered_at < $end")
            .bind(("start", start))
            .bind(("end", end))
            .await?
            .take(0)?;
        Ok(records)
    }

    /// Vehicle/visitor rows for usage-distribution aggregation
    ///
    /// 聚合在调用方内存中完成 (去重车辆、访客占比)。
    pub async fn usage_rows_between(&self, start: i64, end: i64) -> RepoResult<Vec<UsageRow>> {
        let rows: Vec<UsageRow> = self
            .base
            .db()
            .query(
                "SELECT vehicle, vehicle.is_visitor AS is_visitor, space.floor AS floor \
                 FROM parking_record WHERE entered_at >= $start AND entered_at < $end",
            )
            .bind(("start", start))
            .bind(("end", end))
            .await?
            .take(0)?;
        Ok(rows)
    }
}
