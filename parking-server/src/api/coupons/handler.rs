//! Coupon API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::AppError;
use crate::core::ServerState;
use crate::db::models::{Coupon, CouponCreate, CouponUpdate};
use crate::db::repository::CouponRepository;
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppResult, time};

#[derive(Debug, Serialize)]
pub struct CouponListResponse {
    pub coupons: Vec<Coupon>,
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
}

fn validate_value(value: f64) -> AppResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::validation("value must be a positive number"));
    }
    Ok(())
}

/// GET /api/coupons - 获取所有优惠券 (含状态统计)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<CouponListResponse>> {
    let repo = CouponRepository::new(state.db.clone());
    let coupons = repo.find_all().await?;
    let total = coupons.len();
    let active = coupons.iter().filter(|c| c.is_active).count();
    Ok(Json(CouponListResponse {
        total,
        active,
        inactive: total - active,
        coupons,
    }))
}

/// GET /api/coupons/available - 今天可用的优惠券 (出场页面)
pub async fn available(State(state): State<ServerState>) -> AppResult<Json<Vec<Coupon>>> {
    let repo = CouponRepository::new(state.db.clone());
    let today = time::today_str(state.tz());
    let coupons = repo.find_available(&today).await?;
    Ok(Json(coupons))
}

/// GET /api/coupons/:id - 获取单个优惠券
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Coupon>> {
    let repo = CouponRepository::new(state.db.clone());
    let coupon = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Coupon {} not found", id)))?;
    Ok(Json(coupon))
}

/// POST /api/coupons - 创建优惠券
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CouponCreate>,
) -> AppResult<Json<Coupon>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_value(payload.value)?;
    time::parse_date(&payload.valid_from)?;
    time::parse_date(&payload.valid_until)?;

    let repo = CouponRepository::new(state.db.clone());
    let coupon = repo.create(payload).await?;
    Ok(Json(coupon))
}

/// PUT /api/coupons/:id - 更新优惠券
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<CouponUpdate>,
) -> AppResult<Json<Coupon>> {
    if let Some(name) = payload.name.as_deref() {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(value) = payload.value {
        validate_value(value)?;
    }
    if let Some(from) = payload.valid_from.as_deref() {
        time::parse_date(from)?;
    }
    if let Some(until) = payload.valid_until.as_deref() {
        time::parse_date(until)?;
    }

    let repo = CouponRepository::new(state.db.clone());
    let coupon = repo.update(&id, payload).await?;
    Ok(Json(coupon))
}

/// DELETE /api/coupons/:id - 删除优惠券
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = CouponRepository::new(state.db.clone());
    repo.find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Coupon {} not found", id)))?;
    let result = repo.delete(&id).await?;
    Ok(Json(result))
}
