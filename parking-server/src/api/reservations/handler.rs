//! Reservation API Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::Timelike;
use chrono_tz::Tz;
use serde::Deserialize;
use surrealdb::RecordId;

use crate::AppError;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{
    Reservation, ReservationCreate, ReservationStatus, ReservationUpdate, SpaceStatus, Vehicle,
};
use crate::db::repository::reservation::ReservationDetail;
use crate::db::repository::{ReservationRepository, SpaceRepository, VehicleRepository};
use crate::utils::{AppResult, time};

const HOUR_MILLIS: i64 = 60 * 60 * 1000;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<ReservationStatus>,
}

/// Reservation timing rules
///
/// - 不允许过去的日期
/// - 当天预约必须晚于当前整点
/// - 至少提前 1 小时
fn validate_schedule(date: &str, start_time: &str, now_millis: i64, tz: Tz) -> AppResult<()> {
    let date_d = time::parse_date(date)?;
    let time_t = time::parse_time(start_time)?;

    let today = time::millis_to_local_date(now_millis, tz);
    if date_d < today {
        return Err(AppError::validation(
            "You cannot make reservations for past dates",
        ));
    }

    if date_d == today {
        let current_hour = time::millis_to_local_hour(now_millis, tz);
        if time_t.hour() <= current_hour {
            return Err(AppError::validation(format!(
                "Reservations for today must start at {}:00 or later",
                current_hour + 1
            )));
        }
    }

    let start_millis = time::date_time_to_millis(date_d, time_t, tz);
    if start_millis - now_millis < HOUR_MILLIS {
        return Err(AppError::validation(
            "Reservations require at least 1 hour of advance notice",
        ));
    }

    Ok(())
}

/// Resolve a vehicle the caller may reserve with
///
/// 员工可以代任何注册车辆预约；客户只能用自己的活跃注册车辆。
async fn reservable_vehicle(
    state: &ServerState,
    user: &CurrentUser,
    vehicle_ref: &RecordId,
) -> AppResult<Vehicle> {
    let repo = VehicleRepository::new(state.db.clone());
    let vehicle = repo
        .find_by_id(&vehicle_ref.to_string())
        .await?
        .ok_or_else(|| AppError::not_found("Vehicle not found".to_string()))?;

    if vehicle.is_visitor || !vehicle.is_active {
        return Err(AppError::validation("Vehicle is not valid for reservations"));
    }
    if !user.is_staff() {
        let owner: RecordId = user
            .id
            .parse()
            .map_err(|_| AppError::internal("Malformed account id in token"))?;
        if vehicle.owner.as_ref() != Some(&owner) {
            return Err(AppError::forbidden("Vehicle does not belong to you"));
        }
    }
    Ok(vehicle)
}

/// Load a reservation the caller may manage
async fn managed_reservation(
    state: &ServerState,
    user: &CurrentUser,
    id: &str,
) -> AppResult<Reservation> {
    let repo = ReservationRepository::new(state.db.clone());
    let reservation = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Reservation {} not found", id)))?;

    if !matches!(
        reservation.status,
        ReservationStatus::Pending | ReservationStatus::Confirmed
    ) {
        return Err(AppError::business_rule(
            "Reservation is no longer modifiable",
        ));
    }

    if !user.is_staff() {
        // 归属检查走车辆的 owner 链
        reservable_vehicle(state, user, &reservation.vehicle).await?;
    }
    Ok(reservation)
}

/// POST /api/reservations - 创建预约
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ReservationCreate>,
) -> AppResult<Json<Reservation>> {
    let now = time::now_millis();
    let tz = state.tz();

    validate_schedule(&payload.date, &payload.start_time, now, tz)?;
    if let Some(end) = payload.end_time.as_deref() {
        time::parse_time(end)?;
    }

    reservable_vehicle(&state, &user, &payload.vehicle).await?;

    let spaces = SpaceRepository::new(state.db.clone());
    let space = spaces
        .find_by_id(&payload.space.to_string())
        .await?
        .ok_or_else(|| AppError::not_found("Space not found".to_string()))?;
    if space.status != SpaceStatus::Available {
        return Err(AppError::business_rule("Selected space is not available"));
    }

    let repo = ReservationRepository::new(state.db.clone());
    let conflicts = repo
        .find_conflicts(&payload.space, &payload.date, &payload.start_time, None)
        .await?;
    if !conflicts.is_empty() {
        return Err(AppError::conflict(
            "The space is already reserved at that time",
        ));
    }

    let reservation = repo
        .create(
            payload.date,
            payload.start_time,
            payload.end_time,
            payload.space,
            payload.vehicle,
        )
        .await?;

    tracing::info!(user_id = %user.id, "Reservation created");
    Ok(Json(reservation))
}

/// GET /api/reservations - 所有预约 (员工，状态过滤)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<ReservationDetail>>> {
    let repo = ReservationRepository::new(state.db.clone());
    let reservations = repo.find_all(query.status).await?;
    Ok(Json(reservations))
}

/// GET /api/reservations/mine - 当前客户的预约
pub async fn mine(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<ReservationDetail>>> {
    let owner: RecordId = user
        .id
        .parse()
        .map_err(|_| AppError::internal("Malformed account id in token"))?;

    let repo = ReservationRepository::new(state.db.clone());
    let reservations = repo.find_for_owner(&owner).await?;
    Ok(Json(reservations))
}

/// PUT /api/reservations/:id - 修改预约
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<ReservationUpdate>,
) -> AppResult<Json<Reservation>> {
    let now = time::now_millis();
    let tz = state.tz();

    let existing = managed_reservation(&state, &user, &id).await?;
    let reservation_ref = existing
        .id
        .clone()
        .ok_or_else(|| AppError::internal("Reservation record without id"))?;

    // 客户只能在原开始时间 1 小时之前修改
    if !user.is_staff() {
        let current_start = time::date_time_to_millis(
            time::parse_date(&existing.date)?,
            time::parse_time(&existing.start_time)?,
            tz,
        );
        if current_start - now < HOUR_MILLIS {
            return Err(AppError::business_rule(
                "Reservations can only be edited at least 1 hour in advance",
            ));
        }
    }

    let date = payload.date.unwrap_or(existing.date);
    let start_time = payload.start_time.unwrap_or(existing.start_time);
    let end_time = payload.end_time.or(existing.end_time);
    let space = payload.space.unwrap_or(existing.space);
    let vehicle = payload.vehicle.unwrap_or(existing.vehicle);

    validate_schedule(&date, &start_time, now, tz)?;
    if let Some(end) = end_time.as_deref() {
        time::parse_time(end)?;
    }
    reservable_vehicle(&state, &user, &vehicle).await?;

    let spaces = SpaceRepository::new(state.db.clone());
    let space_rec = spaces
        .find_by_id(&space.to_string())
        .await?
        .ok_or_else(|| AppError::not_found("Space not found".to_string()))?;
    if space_rec.status != SpaceStatus::Available {
        return Err(AppError::business_rule("Selected space is not available"));
    }

    let repo = ReservationRepository::new(state.db.clone());
    let conflicts = repo
        .find_conflicts(&space, &date, &start_time, Some(&reservation_ref))
        .await?;
    if !conflicts.is_empty() {
        return Err(AppError::conflict(
            "The space is already reserved at that time",
        ));
    }

    let reservation = repo
        .update_schedule(&reservation_ref, date, start_time, end_time, space, vehicle)
        .await?;
    Ok(Json(reservation))
}

/// POST /api/reservations/:id/cancel - 取消预约 (任何时候允许)
pub async fn cancel(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Reservation>> {
    let existing = managed_reservation(&state, &user, &id).await?;
    let reservation_ref = existing
        .id
        .ok_or_else(|| AppError::internal("Reservation record without id"))?;

    let repo = ReservationRepository::new(state.db.clone());
    let reservation = repo
        .set_status(
            &reservation_ref,
            ReservationStatus::Cancelled,
            existing.is_confirmed,
        )
        .await?;
    Ok(Json(reservation))
}

/// POST /api/reservations/:id/confirm - 确认到场意向
pub async fn confirm(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Reservation>> {
    let existing = managed_reservation(&state, &user, &id).await?;
    let reservation_ref = existing
        .id
        .ok_or_else(|| AppError::internal("Reservation record without id"))?;

    let repo = ReservationRepository::new(state.db.clone());
    let reservation = repo
        .set_status(&reservation_ref, ReservationStatus::Confirmed, true)
        .await?;
    Ok(Json(reservation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn bogota() -> Tz {
        "America/Bogota".parse().unwrap()
    }

    /// Fixed "now": 2025-06-10 09:30 local
    fn fixed_now() -> i64 {
        time::date_time_to_millis(
            NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            bogota(),
        )
    }

    #[test]
    fn test_past_date_rejected() {
        let err = validate_schedule("2025-06-09", "10:00", fixed_now(), bogota());
        assert!(err.is_err());
    }

    #[test]
    fn test_same_hour_today_rejected() {
        // 09:xx now → a 09:00 start today is in the current hour
        let err = validate_schedule("2025-06-10", "09:00", fixed_now(), bogota());
        assert!(err.is_err());
    }

    #[test]
    fn test_less_than_one_hour_ahead_rejected() {
        // 10:00 is after the current hour but only 30 minutes away
        let err = validate_schedule("2025-06-10", "10:00", fixed_now(), bogota());
        assert!(err.is_err());
    }

    #[test]
    fn test_valid_same_day_reservation() {
        assert!(validate_schedule("2025-06-10", "11:00", fixed_now(), bogota()).is_ok());
    }

    #[test]
    fn test_future_date_accepted() {
        assert!(validate_schedule("2025-06-11", "08:00", fixed_now(), bogota()).is_ok());
    }

    #[test]
    fn test_malformed_inputs_rejected() {
        assert!(validate_schedule("10/06/2025", "11:00", fixed_now(), bogota()).is_err());
        assert!(validate_schedule("2025-06-10", "27:00", fixed_now(), bogota()).is_err());
    }
}
