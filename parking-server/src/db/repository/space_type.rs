//! Space Type Repository

use super::{BaseRepository, CountRow, RepoError, RepoResult};
use crate::db::models::{SpaceType, SpaceTypeCreate, SpaceTypeUpdate};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "space_type";

#[derive(Clone)]
pub struct SpaceTypeRepository {
    base: BaseRepository,
}

impl SpaceTypeRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all space types
    pub async fn find_all(&self) -> RepoResult<Vec<SpaceType>> {
        let types: Vec<SpaceType> = self
            .base
            .db()
            .query("SELECT * FROM space_type ORDER BY name")
            .await?
            .take(0)?;
        Ok(types)
    }

    /// Find space type by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<SpaceType>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let space_type: Option<SpaceType> = self.base.db().select(thing).await?;
        Ok(space_type)
    }

    /// Find space type by name (exact match)
    pub async fn find_by_name(&self, name: &str) -> RepoResult<Option<SpaceType>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM space_type WHERE name = $name LIMIT 1")
            .bind(("name", name.to_string()))
            .await?;
        let types: Vec<SpaceType> = result.take(0)?;
        Ok(types.into_iter().next())
    }

    /// Create a new space type
    pub async fn create(&self, data: SpaceTypeCreate) -> RepoResult<SpaceType> {
        if self.find_by_name(&data.name).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Space type '{}' already exists",
                data.name
            )));
        }

        let space_type = SpaceType {
            id: None,
            name: data.name,
        };

        let created: Option<SpaceType> = self.base.db().create(TABLE).content(space_type).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create space type".to_string()))
    }

    /// Update a space type
    pub async fn update(&self, id: &str, data: SpaceTypeUpdate) -> RepoResult<SpaceType> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Space type {} not found", id)))?;

        let name = data.name.unwrap_or(existing.name);

        if let Some(found) = self.find_by_name(&name).await?
            && found.id != existing.id
        {
            return Err(RepoError::Duplicate(format!(
                "Space type '{}' already exists",
                name
            )));
        }

        self.base
            .db()
            .query("UPDATE $thing SET name = $name")
            .bind(("thing", thing))
            .bind(("name", name))
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Space type {} not found", id)))
    }

    /// Hard delete a space type
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

    /// Count spaces referencing a space type
    pub async fn count_spaces(&self, space_type: &RecordId) -> RepoResult<i64> {
        let row: Option<CountRow> = self
            .base
            .db()
            .query("SELECT count() AS count FROM space WHERE space_type = $space_type GROUP ALL")
            .bind(("space_type", space_type.clone()))
            .await?
            .take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }

    /// Count tariffs referencing a space type
    pub async fn count_tariffs(&self, space_type: &RecordId) -> RepoResult<i64> {
        let row: Option<CountRow> = self
            .base
            .db()
            .query("SELECT count() AS count FROM tariff WHERE space_type = $space_type GROUP ALL")
            .bind(("space_type", space_type.clone()))
            .await?
            .take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }
}
