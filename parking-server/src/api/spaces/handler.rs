//! Space API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::AppError;
use crate::core::ServerState;
use crate::db::models::{Space, SpaceCreate, SpaceRangeCreate, SpaceStatus, SpaceUpdate};
use crate::db::repository::space::{SpaceFilter, SpaceStatusCounts};
use crate::db::repository::SpaceRepository;
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_required_text};
use crate::utils::AppResult;

/// Maximum spaces one range request may create
const MAX_RANGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub floor: Option<String>,
    pub space_type: Option<String>,
    pub status: Option<SpaceStatus>,
}

#[derive(Debug, Serialize)]
pub struct SpacesListResponse {
    pub spaces: Vec<Space>,
    pub stats: SpaceStatusCounts,
}

#[derive(Debug, Serialize)]
pub struct RangeCreateResponse {
    pub created: u32,
    pub skipped: u32,
}

fn parse_ref(id: &str, field: &str) -> AppResult<RecordId> {
    id.parse()
        .map_err(|_| AppError::validation(format!("Invalid {}: {}", field, id)))
}

/// GET /api/spaces - 车位列表 (过滤 + 全局状态统计)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<SpacesListResponse>> {
    let repo = SpaceRepository::new(state.db.clone());

    let filter = SpaceFilter {
        q: query.q,
        floor: query.floor.as_deref().map(|f| parse_ref(f, "floor")).transpose()?,
        space_type: query
            .space_type
            .as_deref()
            .map(|t| parse_ref(t, "space_type"))
            .transpose()?,
        status: query.status,
    };

    let spaces = repo.find_filtered(filter).await?;
    let stats = repo.status_counts().await?;
    Ok(Json(SpacesListResponse { spaces, stats }))
}

/// GET /api/spaces/:id - 获取单个车位
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Space>> {
    let repo = SpaceRepository::new(state.db.clone());
    let space = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Space {} not found", id)))?;
    Ok(Json(space))
}

/// POST /api/spaces - 创建车位
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<SpaceCreate>,
) -> AppResult<Json<Space>> {
    validate_required_text(&payload.number, "number", MAX_SHORT_TEXT_LEN)?;

    let repo = SpaceRepository::new(state.db.clone());
    let space = repo.create(payload).await?;
    Ok(Json(space))
}

/// POST /api/spaces/range - 批量创建车位 (前缀 + 序号区间)
///
/// 同一楼层已存在的编号跳过不报错。
pub async fn create_range(
    State(state): State<ServerState>,
    Json(payload): Json<SpaceRangeCreate>,
) -> AppResult<Json<RangeCreateResponse>> {
    validate_required_text(&payload.prefix, "prefix", MAX_SHORT_TEXT_LEN)?;
    if payload.start > payload.end {
        return Err(AppError::validation("start must not exceed end"));
    }
    if payload.end - payload.start + 1 > MAX_RANGE_SIZE {
        return Err(AppError::validation(format!(
            "At most {} spaces per range",
            MAX_RANGE_SIZE
        )));
    }

    let repo = SpaceRepository::new(state.db.clone());
    let mut created = 0;
    let mut skipped = 0;
    for i in payload.start..=payload.end {
        let number = format!("{}{:02}", payload.prefix, i);
        if repo
            .find_by_number_on_floor(&payload.floor, &number)
            .await?
            .is_some()
        {
            skipped += 1;
            continue;
        }
        repo.create(SpaceCreate {
            number,
            floor: payload.floor.clone(),
            space_type: payload.space_type.clone(),
            status: None,
        })
        .await?;
        created += 1;
    }

    tracing::info!(created, skipped, "Range space creation finished");
    Ok(Json(RangeCreateResponse { created, skipped }))
}

/// PUT /api/spaces/:id - 更新车位
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<SpaceUpdate>,
) -> AppResult<Json<Space>> {
    if let Some(number) = payload.number.as_deref() {
        validate_required_text(number, "number", MAX_SHORT_TEXT_LEN)?;
    }

    let repo = SpaceRepository::new(state.db.clone());
    let space = repo.update(&id, payload).await?;
    Ok(Json(space))
}

/// DELETE /api/spaces/:id - 删除车位
///
/// 占用中的车位拒绝删除。
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = SpaceRepository::new(state.db.clone());
    let space = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Space {} not found", id)))?;

    if space.status == SpaceStatus::Occupied {
        return Err(AppError::business_rule("Cannot delete an occupied space"));
    }

    let result = repo.delete(&id).await?;
    Ok(Json(result))
}
