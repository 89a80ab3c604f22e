//! Authentication Handlers
//!
//! Handles login, registration and token management

use std::time::Duration;

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::AppError;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Role, UserAccount, UserAccountCreate};
use crate::db::repository::UserAccountRepository;
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_password, validate_required_text,
};
use crate::utils::{AppResult, time};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub document: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub document: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub is_active: bool,
    pub registered_at: i64,
}

impl From<UserAccount> for UserInfo {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.id.map(|id| id.to_string()).unwrap_or_default(),
            document: account.document,
            full_name: account.full_name,
            email: account.email,
            phone: account.phone,
            role: account.role,
            is_active: account.is_active,
            registered_at: account.registered_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// POST /api/auth/login - 登录
///
/// 统一的错误消息防止邮箱枚举；固定延迟抵御时序攻击。
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let repo = UserAccountRepository::new(state.db.clone());
    let account = repo.find_by_email(&req.email).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    let account = match account {
        Some(a) => a,
        None => {
            tracing::warn!(email = %req.email, "Login failed - account not found");
            return Err(AppError::invalid_credentials());
        }
    };

    if !account.is_active {
        return Err(AppError::forbidden(
            "Your account is disabled. Contact the administrator",
        ));
    }

    let password_valid = account
        .verify_password(&req.password)
        .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;
    if !password_valid {
        tracing::warn!(email = %req.email, "Login failed - invalid credentials");
        return Err(AppError::invalid_credentials());
    }

    let user_id = account
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default();

    let token = state
        .get_jwt_service()
        .generate_token(&user_id, &account.full_name, &account.email, account.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(
        user_id = %user_id,
        email = %account.email,
        role = %account.role,
        "User logged in successfully"
    );

    Ok(Json(LoginResponse {
        token,
        user: account.into(),
    }))
}

/// POST /api/auth/register - 客户自助注册
///
/// 注册账户固定为 CUSTOMER 角色。
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<LoginResponse>> {
    validate_required_text(&req.document, "document", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&req.full_name, "full_name", MAX_NAME_LEN)?;
    validate_required_text(&req.email, "email", MAX_EMAIL_LEN)?;

    if req.document.trim().len() < 6 {
        return Err(AppError::validation(
            "Document must be at least 6 characters",
        ));
    }
    if req.password != req.password_confirm {
        return Err(AppError::validation("Passwords do not match"));
    }
    validate_password(&req.password)?;

    let repo = UserAccountRepository::new(state.db.clone());
    let account = repo
        .create(
            UserAccountCreate {
                document: req.document,
                full_name: req.full_name,
                email: req.email,
                phone: req.phone,
                password: req.password,
                role: Some(Role::Customer),
            },
            time::now_millis(),
        )
        .await?;

    let user_id = account
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default();

    let token = state
        .get_jwt_service()
        .generate_token(&user_id, &account.full_name, &account.email, account.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(user_id = %user_id, email = %account.email, "Customer registered");

    Ok(Json(LoginResponse {
        token,
        user: account.into(),
    }))
}

/// GET /api/auth/me - 当前用户信息
pub async fn me(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<UserInfo>> {
    let repo = UserAccountRepository::new(state.db.clone());
    let account = repo
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Account no longer exists".to_string()))?;
    Ok(Json(account.into()))
}

/// POST /api/auth/logout - 登出 (无服务端会话，仅审计日志)
pub async fn logout(Extension(user): Extension<CurrentUser>) -> AppResult<Json<()>> {
    tracing::info!(user_id = %user.id, email = %user.email, "User logged out");
    Ok(Json(()))
}
