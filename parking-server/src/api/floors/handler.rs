//! Floor API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::AppError;
use crate::core::ServerState;
use crate::db::models::{Floor, FloorCreate, FloorUpdate};
use crate::db::repository::FloorRepository;
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use crate::utils::AppResult;

/// Floor row with occupancy stats for the admin listing
#[derive(Debug, Serialize)]
pub struct FloorSummary {
    #[serde(flatten)]
    pub floor: Floor,
    pub total: i64,
    pub occupied: i64,
    pub free: i64,
    pub percentage: i64,
}

/// GET /api/floors - 获取所有楼层 (含占用统计)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<FloorSummary>>> {
    let repo = FloorRepository::new(state.db.clone());
    let floors = repo.find_all().await?;

    let mut summaries = Vec::with_capacity(floors.len());
    for floor in floors {
        let floor_ref = floor
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Floor record without id"))?;
        let total = repo.count_spaces(&floor_ref, None).await?;
        let occupied = repo.count_spaces(&floor_ref, Some("OCCUPIED")).await?;
        let percentage = if total > 0 {
            occupied * 100 / total
        } else {
            0
        };
        summaries.push(FloorSummary {
            floor,
            total,
            occupied,
            free: total - occupied,
            percentage,
        });
    }
    Ok(Json(summaries))
}

/// GET /api/floors/:id - 获取单个楼层
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Floor>> {
    let repo = FloorRepository::new(state.db.clone());
    let floor = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Floor {} not found", id)))?;
    Ok(Json(floor))
}

/// POST /api/floors - 创建楼层
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<FloorCreate>,
) -> AppResult<Json<Floor>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;

    let repo = FloorRepository::new(state.db.clone());
    let floor = repo.create(payload).await?;
    Ok(Json(floor))
}

/// PUT /api/floors/:id - 更新楼层
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<FloorUpdate>,
) -> AppResult<Json<Floor>> {
    if let Some(name) = payload.name.as_deref() {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }

    let repo = FloorRepository::new(state.db.clone());
    let floor = repo.update(&id, payload).await?;
    Ok(Json(floor))
}

/// DELETE /api/floors/:id - 删除楼层
///
/// 有占用车位时拒绝删除。
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = FloorRepository::new(state.db.clone());
    let floor = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Floor {} not found", id)))?;
    let floor_ref = floor
        .id
        .ok_or_else(|| AppError::internal("Floor record without id"))?;

    if repo.count_spaces(&floor_ref, Some("OCCUPIED")).await? > 0 {
        return Err(AppError::business_rule(
            "Cannot delete floor: it has occupied spaces",
        ));
    }

    let result = repo.delete(&id).await?;
    Ok(Json(result))
}
