//! Vehicle API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::AppError;
use crate::core::ServerState;
use crate::db::models::{Vehicle, VehicleCreate, VehicleUpdate};
use crate::db::repository::VehicleRepository;
use crate::utils::validation::{MAX_PLATE_LEN, validate_required_text};
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub plate: String,
}

/// Gate lookup response (check-in form prefill)
#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visitor: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
}

/// GET /api/vehicles - 获取所有车辆
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Vehicle>>> {
    let repo = VehicleRepository::new(state.db.clone());
    let vehicles = repo.find_all(query.q).await?;
    Ok(Json(vehicles))
}

/// GET /api/vehicles/lookup?plate= - 门岗车牌查询 (进场表单预填)
pub async fn lookup(
    State(state): State<ServerState>,
    Query(query): Query<LookupQuery>,
) -> AppResult<Json<LookupResponse>> {
    let plate = query.plate.trim().to_uppercase();
    if plate.is_empty() {
        return Err(AppError::validation("Plate is required"));
    }

    let repo = VehicleRepository::new(state.db.clone());
    let response = match repo.find_by_plate(&plate).await? {
        Some(vehicle) => LookupResponse {
            found: true,
            is_visitor: Some(vehicle.is_visitor),
            contact_name: vehicle.contact_name,
            contact_phone: vehicle.contact_phone,
        },
        None => LookupResponse {
            found: false,
            is_visitor: None,
            contact_name: None,
            contact_phone: None,
        },
    };
    Ok(Json(response))
}

/// GET /api/vehicles/:id - 获取单个车辆
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vehicle>> {
    let repo = VehicleRepository::new(state.db.clone());
    let vehicle = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Vehicle {} not found", id)))?;
    Ok(Json(vehicle))
}

/// POST /api/vehicles - 登记车辆
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<VehicleCreate>,
) -> AppResult<Json<Vehicle>> {
    validate_required_text(&payload.plate, "plate", MAX_PLATE_LEN)?;

    let repo = VehicleRepository::new(state.db.clone());
    let vehicle = repo.create(payload).await?;
    Ok(Json(vehicle))
}

/// PUT /api/vehicles/:id - 更新车辆
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<VehicleUpdate>,
) -> AppResult<Json<Vehicle>> {
    if let Some(plate) = payload.plate.as_deref() {
        validate_required_text(plate, "plate", MAX_PLATE_LEN)?;
    }

    let repo = VehicleRepository::new(state.db.clone());
    let vehicle = repo.update(&id, payload).await?;
    Ok(Json(vehicle))
}

/// DELETE /api/vehicles/:id - 删除车辆
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = VehicleRepository::new(state.db.clone());
    repo.find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Vehicle {} not found", id)))?;
    let result = repo.delete(&id).await?;
    Ok(Json(result))
}
