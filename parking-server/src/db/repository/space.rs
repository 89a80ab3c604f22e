//! Space Repository
//!
//! 除常规 CRUD 外，占用/释放使用条件更新 (compare-and-set)，
//! 避免并发进出场对同一车位的读-改-写竞态。

use super::{BaseRepository, CountRow, RepoError, RepoResult};
use crate::db::models::{Space, SpaceCreate, SpaceStatus, SpaceUpdate};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "space";

/// Listing filters
#[derive(Debug, Default, Clone)]
pub struct SpaceFilter {
    /// Substring match on the space number
    pub q: Option<String>,
    pub floor: Option<RecordId>,
    pub space_type: Option<RecordId>,
    pub status: Option<SpaceStatus>,
}

/// Status counts for the whole registry
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct SpaceStatusCounts {
    pub total: i64,
    pub available: i64,
    pub occupied: i64,
    pub inactive: i64,
}

#[derive(Clone)]
pub struct SpaceRepository {
    base: BaseRepository,
}

impl SpaceRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find spaces matching the filter, ordered by number
    pub async fn find_filtered(&self, filter: SpaceFilter) -> RepoResult<Vec<Space>> {
        let mut query = String::from("SELECT * FROM space");
        let mut conditions: Vec<&str> = Vec::new();

        if filter.q.is_some() {
            conditions.push("number CONTAINS $q");
        }
        if filter.floor.is_some() {
            conditions.push("floor = $floor");
        }
        if filter.space_type.is_some() {
            conditions.push("space_type = $space_type");
        }
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        query.push_str(" ORDER BY number");

        let mut q = self.base.db().query(query);
        if let Some(text) = filter.q {
            q = q.bind(("q", text));
        }
        if let Some(floor) = filter.floor {
            q = q.bind(("floor", floor));
        }
        if let Some(space_type) = filter.space_type {
            q = q.bind(("space_type", space_type));
        }
        if let Some(status) = filter.status {
            q = q.bind(("status", status));
        }

        let spaces: Vec<Space> = q.await?.take(0)?;
        Ok(spaces)
    }

    /// Find space by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Space>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let space: Option<Space> = self.base.db().select(thing).await?;
        Ok(space)
    }

    /// Find space by number on a floor
    pub async fn find_by_number_on_floor(
        &self,
        floor: &RecordId,
        number: &str,
    ) -> RepoResult<Option<Space>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM space WHERE floor = $floor AND number = $number LIMIT 1")
            .bind(("floor", floor.clone()))
            .bind(("number", number.to_string()))
            .await?;
        let spaces: Vec<Space> = result.take(0)?;
        Ok(spaces.into_iter().next())
    }

    /// Create a new space
    pub async fn create(&self, data: SpaceCreate) -> RepoResult<Space> {
        if self
            .find_by_number_on_floor(&data.floor, &data.number)
            .await?
            .is_some()
        {
            return Err(RepoError::Duplicate(format!(
                "Space '{}' already exists on this floor",
                data.number
            )));
        }

        // CREATE via query so floor/space_type are stored as record links
        let created: Vec<Space> = self
            .base
            .db()
            .query(format!(
                "CREATE {TABLE} SET number = $number, floor = $floor, space_type = $space_type, status = $status"
            ))
            .bind(("number", data.number))
            .bind(("floor", data.floor))
            .bind(("space_type", data.space_type))
            .bind(("status", data.status.unwrap_or(SpaceStatus::Available)))
            .await?
            .take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create space".to_string()))
    }

    /// Update a space
    pub async fn update(&self, id: &str, data: SpaceUpdate) -> RepoResult<Space> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Space {} not found", id)))?;

        let check_floor = data.floor.as_ref().unwrap_or(&existing.floor);
        let check_number = data.number.as_ref().unwrap_or(&existing.number);

        if data.number.is_some() || data.floor.is_some() {
            if let Some(found) = self
                .find_by_number_on_floor(check_floor, check_number)
                .await?
                && found.id != existing.id
            {
                return Err(RepoError::Duplicate(format!(
                    "Space '{}' already exists on this floor",
                    check_number
                )));
            }
        }

        let number = data.number.unwrap_or(existing.number);
        let floor = data.floor.unwrap_or(existing.floor);
        let space_type = data.space_type.unwrap_or(existing.space_type);
        let status = data.status.unwrap_or(existing.status);

        self.base
            .db()
            .query("UPDATE $thing SET number = $number, floor = $floor, space_type = $space_type, status = $status")
            .bind(("thing", thing))
            .bind(("number", number))
            .bind(("floor", floor))
            .bind(("space_type", space_type))
            .bind(("status", status))
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Space {} not found", id)))
    }

    /// Hard delete a space
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }

    /// Atomically claim an AVAILABLE space for check-in
    ///
    /// 单条条件更新：status 不是 AVAILABLE 时更新不命中，返回 false。
    pub async fn try_occupy(&self, id: &RecordId) -> RepoResult<bool> {
        let updated: Vec<Space> = self
            .base
            .db()
            .query("UPDATE $thing SET status = $next WHERE status = $expected RETURN AFTER")
            .bind(("thing", id.clone()))
            .bind(("next", SpaceStatus::Occupied))
            .bind(("expected", SpaceStatus::Available))
            .await?
            .take(0)?;
        Ok(!updated.is_empty())
    }

    /// Release a space back to AVAILABLE (unconditional)
    pub async fn release(&self, id: &RecordId) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $thing SET status = $next")
            .bind(("thing", id.clone()))
            .bind(("next", SpaceStatus::Available))
            .await?;
        Ok(())
    }

    /// Count spaces per status over the whole registry
    pub async fn status_counts(&self) -> RepoResult<SpaceStatusCounts> {
        let total = self.count_status(None).await?;
        let available = self.count_status(Some(SpaceStatus::Available)).await?;
        let occupied = self.count_status(Some(SpaceStatus::Occupied)).await?;
        let inactive = self.count_status(Some(SpaceStatus::Inactive)).await?;
        Ok(SpaceStatusCounts {
            total,
            available,
            occupied,
            inactive,
        })
    }

    /// Count spaces, optionally restricted to one status
    pub async fn count_status(&self, status: Option<SpaceStatus>) -> RepoResult<i64> {
        let query = match status {
            Some(_) => "SELECT count() AS count FROM space WHERE status = $status GROUP ALL",
            None => "SELECT count() AS count FROM space GROUP ALL",
        };
        let mut q = self.base.db().query(query);
        if let Some(s) = status {
            q = q.bind(("status", s));
        }
        let row: Option<CountRow> = q.await?.take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }

    /// Count spaces in billable states (AVAILABLE + OCCUPIED)
    pub async fn count_in_service(&self) -> RepoResult<i64> {
        let row: Option<CountRow> = self
            .base
            .db()
            .query("SELECT count() AS count FROM space WHERE status != $inactive GROUP ALL")
            .bind(("inactive", SpaceStatus::Inactive))
            .await?
            .take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }
}
