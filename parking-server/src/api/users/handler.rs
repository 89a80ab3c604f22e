//! User Account API Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::AppError;
use crate::api::auth::UserInfo;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{UserAccountCreate, UserAccountUpdate};
use crate::db::repository::UserAccountRepository;
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_password, validate_required_text,
};
use crate::utils::{AppResult, time};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
}

/// GET /api/users - 获取所有账户
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<UserInfo>>> {
    let repo = UserAccountRepository::new(state.db.clone());
    let accounts = repo.find_all(query.q).await?;
    Ok(Json(accounts.into_iter().map(UserInfo::from).collect()))
}

/// GET /api/users/:id - 获取单个账户
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<UserInfo>> {
    let repo = UserAccountRepository::new(state.db.clone());
    let account = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Account {} not found", id)))?;
    Ok(Json(account.into()))
}

/// POST /api/users - 创建账户 (管理员可指定角色)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<UserAccountCreate>,
) -> AppResult<Json<UserInfo>> {
    validate_required_text(&payload.document, "document", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&payload.full_name, "full_name", MAX_NAME_LEN)?;
    validate_required_text(&payload.email, "email", MAX_EMAIL_LEN)?;
    validate_password(&payload.password)?;

    let repo = UserAccountRepository::new(state.db.clone());
    let account = repo.create(payload, time::now_millis()).await?;
    Ok(Json(account.into()))
}

/// PUT /api/users/:id - 更新账户
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UserAccountUpdate>,
) -> AppResult<Json<UserInfo>> {
    if let Some(password) = payload.password.as_deref() {
        validate_password(password)?;
    }

    let repo = UserAccountRepository::new(state.db.clone());
    let account = repo.update(&id, payload).await?;
    Ok(Json(account.into()))
}

/// DELETE /api/users/:id - 删除账户
///
/// 不允许删除自己的账户。
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    if user.id == id {
        return Err(AppError::business_rule(
            "You cannot delete your own account",
        ));
    }

    let repo = UserAccountRepository::new(state.db.clone());
    repo.find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Account {} not found", id)))?;
    let result = repo.delete(&id).await?;
    Ok(Json(result))
}
