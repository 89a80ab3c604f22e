//! Floor Repository

use super::{BaseRepository, CountRow, RepoError, RepoResult};
use crate::db::models::{Floor, FloorCreate, FloorUpdate};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "floor";

#[derive(Clone)]
pub struct FloorRepository {
    base: BaseRepository,
}

impl FloorRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all floors
    pub async fn find_all(&self) -> RepoResult<Vec<Floor>> {
        let floors: Vec<Floor> = self
            .base
            .db()
            .query("SELECT * FROM floor ORDER BY name")
            .await?
            .take(0)?;
        Ok(floors)
    }

    /// Find active floors only
    pub async fn find_active(&self) -> RepoResult<Vec<Floor>> {
        let floors: Vec<Floor> = self
            .base
            .db()
            .query("SELECT * FROM floor WHERE is_active = true ORDER BY name")
            .await?
            .take(0)?;
        Ok(floors)
    }

    /// Find floor by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Floor>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let floor: Option<Floor> = self.base.db().select(thing).await?;
        Ok(floor)
    }

    /// Create a new floor
    pub async fn create(&self, data: FloorCreate) -> RepoResult<Floor> {
        let floor = Floor {
            id: None,
            name: data.name,
            is_active: data.is_active.unwrap_or(true),
        };

        let created: Option<Floor> = self.base.db().create(TABLE).content(floor).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create floor".to_string()))
    }

    /// Update a floor
    pub async fn update(&self, id: &str, data: FloorUpdate) -> RepoResult<Floor> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Floor {} not found", id)))?;

        let name = data.name.unwrap_or(existing.name);
        let is_active = data.is_active.unwrap_or(existing.is_active);

        self.base
            .db()
            .query("UPDATE $thing SET name = $name, is_active = $is_active")
            .bind(("thing", thing))
            .bind(("name", name))
            .bind(("is_active", is_active))
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Floor {} not found", id)))
    }

    /// Hard delete a floor
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

    /// Count spaces of a floor, optionally restricted to one status
    pub async fn count_spaces(&self, floor: &RecordId, status: Option<&str>) -> RepoResult<i64> {
        let query = match status {
            Some(_) => "SELECT count() AS count FROM space WHERE floor = $floor AND status = $status GROUP ALL",
            None => "SELECT count() AS count FROM space WHERE floor = $floor GROUP ALL",
        };
        let mut q = self.base.db().query(query).bind(("floor", floor.clone()));
        if let Some(s) = status {
            q = q.bind(("status", s.to_string()));
        }
        let row: Option<CountRow> = q.await?.take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }
}
