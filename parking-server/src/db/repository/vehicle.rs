//! Vehicle Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Vehicle, VehicleCreate, VehicleKind, VehicleUpdate};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "vehicle";

#[derive(Clone)]
pub struct VehicleRepository {
    base: BaseRepository,
}

impl VehicleRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all vehicles, optionally filtered by plate substring
    pub async fn find_all(&self, q: Option<String>) -> RepoResult<Vec<Vehicle>> {
        let vehicles: Vec<Vehicle> = match q {
            Some(text) => {
                self.base
                    .db()
                    .query("SELECT * FROM vehicle WHERE plate CONTAINS $q ORDER BY plate")
                    .bind(("q", text.to_uppercase()))
                    .await?
                    .take(0)?
            }
            None => {
                self.base
                    .db()
                    .query("SELECT * FROM vehicle ORDER BY plate")
                    .await?
                    .take(0)?
            }
        };
        Ok(vehicles)
    }

    /// Find active (non-visitor) vehicles of an owner
    pub async fn find_by_owner(&self, owner: &RecordId) -> RepoResult<Vec<Vehicle>> {
        let vehicles: Vec<Vehicle> = self
            .base
            .db()
            .query("SELECT * FROM vehicle WHERE owner = $owner AND is_visitor = false AND is_active = true ORDER BY plate")
            .bind(("owner", owner.clone()))
            .await?
            .take(0)?;
        Ok(vehicles)
    }

    /// Find vehicle by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Vehicle>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let vehicle: Option<Vehicle> = self.base.db().select(thing).await?;
        Ok(vehicle)
    }

    /// Find vehicle by plate (plates are stored uppercase)
    pub async fn find_by_plate(&self, plate: &str) -> RepoResult<Option<Vehicle>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM vehicle WHERE plate = $plate LIMIT 1")
            .bind(("plate", plate.trim().to_uppercase()))
            .await?;
        let vehicles: Vec<Vehicle> = result.take(0)?;
        Ok(vehicles.into_iter().next())
    }

    /// Create a new vehicle
    pub async fn create(&self, data: VehicleCreate) -> RepoResult<Vehicle> {
        let plate = data.plate.trim().to_uppercase();
        if self.find_by_plate(&plate).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Vehicle '{}' already registered",
                plate
            )));
        }

        // CREATE via query so owner is stored as a record link
        let created: Vec<Vehicle> = self
            .base
            .db()
            .query(format!(
                "CREATE {TABLE} SET plate = $plate, kind = $kind, color = $color, brand = $brand, \
                 model = $model, is_active = true, is_visitor = $is_visitor, owner = $owner, \
                 contact_name = $contact_name, contact_phone = $contact_phone"
            ))
            .bind(("plate", plate))
            .bind(("kind", data.kind.unwrap_or(VehicleKind::Car)))
            .bind(("color", data.color))
            .bind(("brand", data.brand))
            .bind(("model", data.model))
            .bind(("is_visitor", data.is_visitor.unwrap_or(data.owner.is_none())))
            .bind(("owner", data.owner))
            .bind(("contact_name", data.contact_name))
            .bind(("contact_phone", data.contact_phone))
            .await?
            .take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create vehicle".to_string()))
    }

    /// Update a vehicle
    pub async fn update(&self, id: &str, data: VehicleUpdate) -> RepoResult<Vehicle> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Vehicle {} not found", id)))?;

        let plate = data
            .plate
            .map(|p| p.trim().to_uppercase())
            .unwrap_or(existing.plate);

        if let Some(found) = self.find_by_plate(&plate).await?
            && found.id != existing.id
        {
            return Err(RepoError::Duplicate(format!(
                "Vehicle '{}' already registered",
                plate
            )));
        }

        // 手动构建 UPDATE 语句，避免 owner 被序列化为字符串
        let kind = data.kind.unwrap_or(existing.kind);
        let color = data.color.or(existing.color);
        let brand = data.brand.or(existing.brand);
        let model = data.model.or(existing.model);
        let is_active = data.is_active.unwrap_or(existing.is_active);
        let is_visitor = existing.is_visitor && data.owner.is_none();
        let owner = data.owner.or(existing.owner);
        let contact_name = data.contact_name.or(existing.contact_name);
        let contact_phone = data.contact_phone.or(existing.contact_phone);

        self.base
            .db()
            .query("UPDATE $thing SET plate = $plate, kind = $kind, color = $color, brand = $brand, model = $model, is_active = $is_active, is_visitor = $is_visitor, owner = $owner, contact_name = $contact_name, contact_phone = $contact_phone")
            .bind(("thing", thing))
            .bind(("plate", plate))
            .bind(("kind", kind))
            .bind(("color", color))
            .bind(("brand", brand))
            .bind(("model", model))
            .bind(("is_active", is_active))
            .bind(("is_visitor", is_visitor))
            .bind(("owner", owner))
            .bind(("contact_name", contact_name))
            .bind(("contact_phone", contact_phone))
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Vehicle {} not found", id)))
    }

    /// Update visitor contact info when fresh data arrives at the gate
    pub async fn update_contact(
        &self,
        id: &RecordId,
        contact_name: Option<String>,
        contact_phone: Option<String>,
    ) -> RepoResult<()> {
        if contact_name.is_none() && contact_phone.is_none() {
            return Ok(());
        }
        let mut sets: Vec<&str> = Vec::new();
        if contact_name.is_some() {
            sets.push("contact_name = $contact_name");
        }
        if contact_phone.is_some() {
            sets.push("contact_phone = $contact_phone");
        }
        let query = format!("UPDATE $thing SET {}", sets.join(", "));

        let mut q = self.base.db().query(query).bind(("thing", id.clone()));
        if let Some(name) = contact_name {
            q = q.bind(("contact_name", name));
        }
        if let Some(phone) = contact_phone {
            q = q.bind(("contact_phone", phone));
        }
        q.await?;
        Ok(())
    }

    /// Hard delete a vehicle
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
