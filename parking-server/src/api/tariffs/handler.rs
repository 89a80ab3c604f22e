//! Tariff API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::AppError;
use crate::core::ServerState;
use crate::db::models::{Tariff, TariffCreate, TariffUpdate};
use crate::db::repository::TariffRepository;
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use crate::utils::{AppResult, time};

fn validate_prices(hourly: f64, daily: f64, monthly: f64) -> AppResult<()> {
    for (value, field) in [
        (hourly, "hourly_price"),
        (daily, "daily_price"),
        (monthly, "monthly_price"),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::validation(format!(
                "{} must be a non-negative number",
                field
            )));
        }
    }
    Ok(())
}

/// GET /api/tariffs - 获取所有费率
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Tariff>>> {
    let repo = TariffRepository::new(state.db.clone());
    let tariffs = repo.find_all().await?;
    Ok(Json(tariffs))
}

/// GET /api/tariffs/:id - 获取单个费率
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Tariff>> {
    let repo = TariffRepository::new(state.db.clone());
    let tariff = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Tariff {} not found", id)))?;
    Ok(Json(tariff))
}

/// POST /api/tariffs - 创建费率
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TariffCreate>,
) -> AppResult<Json<Tariff>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_prices(
        payload.hourly_price,
        payload.daily_price,
        payload.monthly_price,
    )?;
    time::parse_date(&payload.valid_from)?;
    if let Some(until) = payload.valid_until.as_deref() {
        time::parse_date(until)?;
    }

    let repo = TariffRepository::new(state.db.clone());
    let tariff = repo.create(payload).await?;
    Ok(Json(tariff))
}

/// PUT /api/tariffs/:id - 更新费率
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<TariffUpdate>,
) -> AppResult<Json<Tariff>> {
    if let Some(name) = payload.name.as_deref() {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(from) = payload.valid_from.as_deref() {
        time::parse_date(from)?;
    }
    if let Some(until) = payload.valid_until.as_deref() {
        time::parse_date(until)?;
    }

    let repo = TariffRepository::new(state.db.clone());
    let tariff = repo.update(&id, payload).await?;
    Ok(Json(tariff))
}

/// POST /api/tariffs/:id/toggle - 激活/停用费率
pub async fn toggle(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Tariff>> {
    let repo = TariffRepository::new(state.db.clone());
    let tariff = repo.toggle(&id).await?;
    Ok(Json(tariff))
}

/// DELETE /api/tariffs/:id - 删除费率
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = TariffRepository::new(state.db.clone());
    repo.find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Tariff {} not found", id)))?;
    let result = repo.delete(&id).await?;
    Ok(Json(result))
}
