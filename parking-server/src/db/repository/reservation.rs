//! Reservation Repository

use super::{BaseRepository, CountRow, RepoError, RepoResult};
use crate::db::models::serde_helpers;
use crate::db::models::{Reservation, ReservationStatus};
use serde::{Deserialize, Serialize};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "reservation";

/// Reservation row joined with plate and space number for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationDetail {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub date: String,
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub status: ReservationStatus,
    #[serde(default)]
    pub is_confirmed: bool,
    #[serde(with = "serde_helpers::record_id")]
    pub space: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub vehicle: RecordId,
    #[serde(default)]
    pub plate: Option<String>,
    #[serde(default)]
    pub space_number: Option<String>,
}

#[derive(Clone)]
pub struct ReservationRepository {
    base: BaseRepository,
}

impl ReservationRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create a new reservation (PENDING)
    pub async fn create(
        &self,
        date: String,
        start_time: String,
        end_time: Option<String>,
        space: RecordId,
        vehicle: RecordId,
    ) -> RepoResult<Reservation> {
        let created: Vec<Reservation> = self
            .base
            .db()
            .query(format!(
                "CREATE {TABLE} SET date = $date, start_time = $start_time, end_time = $end_time, \
                 status = $status, is_confirmed = false, space = $space, vehicle = $vehicle"
            ))
            .bind(("date", date))
            .bind(("start_time", start_time))
            .bind(("end_time", end_time))
            .bind(("status", ReservationStatus::Pending))
            .bind(("space", space))
            .bind(("vehicle", vehicle))
            .await?
            .take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create reservation".to_string()))
    }

    /// Find reservation by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Reservation>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let reservation: Option<Reservation> = self.base.db().select(thing).await?;
        Ok(reservation)
    }

    /// All reservations, optionally filtered by status, newest first
    pub async fn find_all(
        &self,
        status: Option<ReservationStatus>,
    ) -> RepoResult<Vec<ReservationDetail>> {
        let reservations: Vec<ReservationDetail> = match status {
            Some(s) => {
                self.base
                    .db()
                    .query(format!(
                        "SELECT *, vehicle.plate AS plate, space.number AS space_number FROM {TABLE} \
                         WHERE status = $status ORDER BY date DESC, start_time DESC"
                    ))
                    .bind(("status", s))
                    .await?
                    .take(0)?
            }
            None => {
                self.base
                    .db()
                    .query(format!(
                        "SELECT *, vehicle.plate AS plate, space.number AS space_number FROM {TABLE} \
                         ORDER BY date DESC, start_time DESC"
                    ))
                    .await?
                    .take(0)?
            }
        };
        Ok(reservations)
    }

    /// Most recent reservations (dashboard widget)
    pub async fn find_recent(&self, limit: usize) -> RepoResult<Vec<ReservationDetail>> {
        let reservations: Vec<ReservationDetail> = self
            .base
            .db()
            .query(format!(
                "SELECT *, vehicle.plate AS plate, space.number AS space_number FROM {TABLE} \
                 ORDER BY date DESC, start_time DESC LIMIT {limit}"
            ))
            .await?
            .take(0)?;
        Ok(reservations)
    }

    /// Reservations belonging to an account's vehicles
    pub async fn find_for_owner(&self, owner: &RecordId) -> RepoResult<Vec<ReservationDetail>> {
        let reservations: Vec<ReservationDetail> = self
            .base
            .db()
            .query(format!(
                "SELECT *, vehicle.plate AS plate, space.number AS space_number FROM {TABLE} \
                 WHERE vehicle.owner = $owner ORDER BY date DESC, start_time DESC"
            ))
            .bind(("owner", owner.clone()))
            .await?
            .take(0)?;
        Ok(reservations)
    }

    /// PENDING/CONFIRMED reservations colliding on space + date + start time
    pub async fn find_conflicts(
        &self,
        space: &RecordId,
        date: &str,
        start_time: &str,
        exclude: Option<&RecordId>,
    ) -> RepoResult<Vec<Reservation>> {
        let mut query = String::from(
            "SELECT * FROM reservation WHERE space = $space AND date = $date \
             AND start_time = $start_time AND status IN [$pending, $confirmed]",
        );
        if exclude.is_some() {
            query.push_str(" AND id != $exclude");
        }

        let mut request = self
            .base
            .db()
            .query(query)
            .bind(("space", space.clone()))
            .bind(("date", date.to_string()))
            .bind(("start_time", start_time.to_string()))
            .bind(("pending", ReservationStatus::Pending))
            .bind(("confirmed", ReservationStatus::Confirmed));
        if let Some(id) = exclude {
            request = request.bind(("exclude", id.clone()));
        }

        let reservations: Vec<Reservation> = request.await?.take(0)?;
        Ok(reservations)
    }

    /// Update schedule fields of a reservation
    pub async fn update_schedule(
        &self,
        id: &RecordId,
        date: String,
        start_time: String,
        end_time: Option<String>,
        space: RecordId,
        vehicle: RecordId,
    ) -> RepoResult<Reservation> {
        let updated: Vec<Reservation> = self
            .base
            .db()
            .query(
                "UPDATE $thing SET date = $date, start_time = $start_time, end_time = $end_time, \
                 space = $space, vehicle = $vehicle RETURN AFTER",
            )
            .bind(("thing", id.clone()))
            .bind(("date", date))
            .bind(("start_time", start_time))
            .bind(("end_time", end_time))
            .bind(("space", space))
            .bind(("vehicle", vehicle))
            .await?
            .take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Reservation {} not found", id)))
    }

    /// Move a reservation to a new status
    pub async fn set_status(
        &self,
        id: &RecordId,
        status: ReservationStatus,
        is_confirmed: bool,
    ) -> RepoResult<Reservation> {
        let updated: Vec<Reservation> = self
            .base
            .db()
            .query("UPDATE $thing SET status = $status, is_confirmed = $is_confirmed RETURN AFTER")
            .bind(("thing", id.clone()))
            .bind(("status", status))
            .bind(("is_confirmed", is_confirmed))
            .await?
            .take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Reservation {} not found", id)))
    }

    /// Count reservations still in play (PENDING or CONFIRMED)
    pub async fn count_active(&self) -> RepoResult<i64> {
        let row: Option<CountRow> = self
            .base
            .db()
            .query("SELECT count() AS count FROM reservation WHERE status IN [$pending, $confirmed] GROUP ALL")
            .bind(("pending", ReservationStatus::Pending))
            .bind(("confirmed", ReservationStatus::Confirmed))
            .await?
            .take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }

    /// Count reservations dated on or after a date (report distribution)
    pub async fn count_from_date(&self, date: &str) -> RepoResult<i64> {
        let row: Option<CountRow> = self
            .base
            .db()
            .query("SELECT count() AS count FROM reservation WHERE date >= $date GROUP ALL")
            .bind(("date", date.to_string()))
            .await?
            .take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }
}
