//! Space Type API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::AppError;
use crate::core::ServerState;
use crate::db::models::{SpaceType, SpaceTypeCreate, SpaceTypeUpdate};
use crate::db::repository::SpaceTypeRepository;
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use crate::utils::AppResult;

/// Space type row with reference counts for the admin listing
#[derive(Debug, Serialize)]
pub struct SpaceTypeSummary {
    #[serde(flatten)]
    pub space_type: SpaceType,
    pub total_spaces: i64,
    pub total_tariffs: i64,
}

/// GET /api/space-types - 获取所有类型 (含引用计数)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<SpaceTypeSummary>>> {
    let repo = SpaceTypeRepository::new(state.db.clone());
    let types = repo.find_all().await?;

    let mut summaries = Vec::with_capacity(types.len());
    for space_type in types {
        let type_ref = space_type
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Space type record without id"))?;
        summaries.push(SpaceTypeSummary {
            total_spaces: repo.count_spaces(&type_ref).await?,
            total_tariffs: repo.count_tariffs(&type_ref).await?,
            space_type,
        });
    }
    Ok(Json(summaries))
}

/// GET /api/space-types/:id - 获取单个类型
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<SpaceType>> {
    let repo = SpaceTypeRepository::new(state.db.clone());
    let space_type = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Space type {} not found", id)))?;
    Ok(Json(space_type))
}

/// POST /api/space-types - 创建类型
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<SpaceTypeCreate>,
) -> AppResult<Json<SpaceType>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;

    let repo = SpaceTypeRepository::new(state.db.clone());
    let space_type = repo.create(payload).await?;
    Ok(Json(space_type))
}

/// PUT /api/space-types/:id - 更新类型
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<SpaceTypeUpdate>,
) -> AppResult<Json<SpaceType>> {
    if let Some(name) = payload.name.as_deref() {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }

    let repo = SpaceTypeRepository::new(state.db.clone());
    let space_type = repo.update(&id, payload).await?;
    Ok(Json(space_type))
}

/// DELETE /api/space-types/:id - 删除类型
///
/// 仍有车位引用时拒绝删除。
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = SpaceTypeRepository::new(state.db.clone());
    let space_type = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Space type {} not found", id)))?;
    let type_ref = space_type
        .id
        .ok_or_else(|| AppError::internal("Space type record without id"))?;

    if repo.count_spaces(&type_ref).await? > 0 {
        return Err(AppError::business_rule(
            "Cannot delete space type: spaces reference it",
        ));
    }

    let result = repo.delete(&id).await?;
    Ok(Json(result))
}
