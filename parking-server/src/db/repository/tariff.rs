//! Tariff Repository
//!
//! 同一车位类型同一时刻至多一个 active 费率：create / update / toggle
//! 在写入前检查并拒绝第二个 active 费率，消除查找时的 first-match 歧义。

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Tariff, TariffCreate, TariffUpdate};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "tariff";

#[derive(Clone)]
pub struct TariffRepository {
    base: BaseRepository,
}

impl TariffRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all tariffs
    pub async fn find_all(&self) -> RepoResult<Vec<Tariff>> {
        let tariffs: Vec<Tariff> = self
            .base
            .db()
            .query("SELECT * FROM tariff ORDER BY name")
            .await?
            .take(0)?;
        Ok(tariffs)
    }

    /// Find tariff by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Tariff>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let tariff: Option<Tariff> = self.base.db().select(thing).await?;
        Ok(tariff)
    }

    /// Find the active tariff flagged for a space type (ignoring validity dates)
    pub async fn find_active_for_type(&self, space_type: &RecordId) -> RepoResult<Option<Tariff>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM tariff WHERE space_type = $space_type AND is_active = true LIMIT 1")
            .bind(("space_type", space_type.clone()))
            .await?;
        let tariffs: Vec<Tariff> = result.take(0)?;
        Ok(tariffs.into_iter().next())
    }

    /// Find the tariff usable for billing a space type today
    ///
    /// active 标志之外还检查有效期窗口 (valid_until 为空表示开放式)。
    pub async fn find_usable_for_type(
        &self,
        space_type: &RecordId,
        today: &str,
    ) -> RepoResult<Option<Tariff>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM tariff WHERE space_type = $space_type AND is_active = true \
                 AND valid_from <= $today AND (valid_until IS NONE OR valid_until >= $today) LIMIT 1",
            )
            .bind(("space_type", space_type.clone()))
            .bind(("today", today.to_string()))
            .await?;
        let tariffs: Vec<Tariff> = result.take(0)?;
        Ok(tariffs.into_iter().next())
    }

    /// Create a new tariff
    pub async fn create(&self, data: TariffCreate) -> RepoResult<Tariff> {
        let is_active = data.is_active.unwrap_or(true);
        if is_active
            && let Some(existing) = self.find_active_for_type(&data.space_type).await?
        {
            return Err(RepoError::Duplicate(format!(
                "An active tariff ('{}') already exists for this space type",
                existing.name
            )));
        }

        // CREATE via query so space_type is stored as a record link
        let created: Vec<Tariff> = self
            .base
            .db()
            .query(format!(
                "CREATE {TABLE} SET name = $name, space_type = $space_type, hourly_price = $hourly_price, \
                 daily_price = $daily_price, monthly_price = $monthly_price, is_active = $is_active, \
                 valid_from = $valid_from, valid_until = $valid_until"
            ))
            .bind(("name", data.name))
            .bind(("space_type", data.space_type))
            .bind(("hourly_price", data.hourly_price))
            .bind(("daily_price", data.daily_price))
            .bind(("monthly_price", data.monthly_price))
            .bind(("is_active", is_active))
            .bind(("valid_from", data.valid_from))
            .bind(("valid_until", data.valid_until))
            .await?
            .take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create tariff".to_string()))
    }

    /// Update a tariff
    pub async fn update(&self, id: &str, data: TariffUpdate) -> RepoResult<Tariff> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Tariff {} not found", id)))?;

        let space_type = data.space_type.unwrap_or(existing.space_type);
        let is_active = data.is_active.unwrap_or(existing.is_active);

        if is_active
            && let Some(found) = self.find_active_for_type(&space_type).await?
            && found.id != existing.id
        {
            return Err(RepoError::Duplicate(format!(
                "An active tariff ('{}') already exists for this space type",
                found.name
            )));
        }

        let name = data.name.unwrap_or(existing.name);
        let hourly_price = data.hourly_price.unwrap_or(existing.hourly_price);
        let daily_price = data.daily_price.unwrap_or(existing.daily_price);
        let monthly_price = data.monthly_price.unwrap_or(existing.monthly_price);
        let valid_from = data.valid_from.unwrap_or(existing.valid_from);
        let valid_until = data.valid_until.or(existing.valid_until);

        self.base
            .db()
            .query("UPDATE $thing SET name = $name, space_type = $space_type, hourly_price = $hourly_price, daily_price = $daily_price, monthly_price = $monthly_price, is_active = $is_active, valid_from = $valid_from, valid_until = $valid_until")
            .bind(("thing", thing))
            .bind(("name", name))
            .bind(("space_type", space_type))
            .bind(("hourly_price", hourly_price))
            .bind(("daily_price", daily_price))
            .bind(("monthly_price", monthly_price))
            .bind(("is_active", is_active))
            .bind(("valid_from", valid_from))
            .bind(("valid_until", valid_until))
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Tariff {} not found", id)))
    }

    /// Flip the active flag
    ///
    /// 激活时执行与 create 相同的唯一性检查。
    pub async fn toggle(&self, id: &str) -> RepoResult<Tariff> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Tariff {} not found", id)))?;

        let next_active = !existing.is_active;
        if next_active
            && let Some(found) = self.find_active_for_type(&existing.space_type).await?
            && found.id != existing.id
        {
            return Err(RepoError::Duplicate(format!(
                "An active tariff ('{}') already exists for this space type",
                found.name
            )));
        }

        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        self.base
            .db()
            .query("UPDATE $thing SET is_active = $is_active")
            .bind(("thing", thing))
            .bind(("is_active", next_active))
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Tariff {} not found", id)))
    }

    /// Hard delete a tariff
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
}
