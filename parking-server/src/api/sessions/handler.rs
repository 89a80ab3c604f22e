//! Parking Session API Handlers
//!
//! 进出场、在场估价与台账列表。流程逻辑在 [`SessionManager`]，
//! handler 只做参数解析与上下文注入。

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::AppError;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::PaymentMethod;
use crate::db::repository::parking_record::ParkingRecordDetail;
use crate::db::repository::{ParkingRecordRepository, PaymentRepository};
use crate::sessions::{CheckInOutcome, CheckInRequest, CheckOutOutcome, CheckOutTarget, OccupancyDetail, SessionManager};
use crate::utils::{AppResult, time};

#[derive(Debug, Deserialize)]
pub struct CheckOutRequest {
    pub space_id: Option<String>,
    pub record_id: Option<String>,
    pub method: Option<PaymentMethod>,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelfCheckOutRequest {
    pub method: Option<PaymentMethod>,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OccupancyQuery {
    pub space_id: Option<String>,
    pub record_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
}

/// Session row with duration and settled amount for the inventory listing
#[derive(Debug, Serialize)]
pub struct SessionListItem {
    #[serde(flatten)]
    pub record: ParkingRecordDetail,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub records: Vec<SessionListItem>,
    pub vehicles_inside: i64,
    pub exits_today: i64,
    pub total_records: i64,
}

fn manager(state: &ServerState) -> SessionManager {
    SessionManager::new(state.db.clone(), state.tz())
}

/// POST /api/sessions/check-in - 登记进场
pub async fn check_in(
    State(state): State<ServerState>,
    Json(req): Json<CheckInRequest>,
) -> AppResult<Json<CheckInOutcome>> {
    let outcome = manager(&state).check_in(req, time::now_millis()).await?;
    Ok(Json(outcome))
}

/// POST /api/sessions/check-out - 登记出场 (门岗，按车位或记录)
pub async fn check_out(
    State(state): State<ServerState>,
    Json(req): Json<CheckOutRequest>,
) -> AppResult<Json<CheckOutOutcome>> {
    let target = match (req.record_id, req.space_id) {
        (Some(record_id), _) => CheckOutTarget::Record(record_id),
        (None, Some(space_id)) => CheckOutTarget::Space(space_id),
        (None, None) => {
            return Err(AppError::validation("space_id or record_id is required"));
        }
    };

    let outcome = manager(&state)
        .check_out(
            target,
            req.method.unwrap_or(PaymentMethod::Cash),
            req.coupon_code,
            time::now_millis(),
        )
        .await?;
    Ok(Json(outcome))
}

/// POST /api/sessions/my/check-out - 客户自助出场
pub async fn self_check_out(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<SelfCheckOutRequest>,
) -> AppResult<Json<CheckOutOutcome>> {
    let owner: RecordId = user
        .id
        .parse()
        .map_err(|_| AppError::internal("Malformed account id in token"))?;

    let outcome = manager(&state)
        .check_out(
            CheckOutTarget::Owner(owner),
            req.method.unwrap_or(PaymentMethod::Cash),
            req.coupon_code,
            time::now_millis(),
        )
        .await?;
    Ok(Json(outcome))
}

/// GET /api/sessions/my/current - 客户自己的在场会话 (含估价)
pub async fn my_current(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<OccupancyDetail>> {
    let owner: RecordId = user
        .id
        .parse()
        .map_err(|_| AppError::internal("Malformed account id in token"))?;

    let detail = manager(&state)
        .estimate_for_owner(&owner, time::now_millis())
        .await?;
    Ok(Json(detail))
}

/// GET /api/sessions/occupancy - 在场详情与实时估价 (门岗)
pub async fn occupancy(
    State(state): State<ServerState>,
    Query(query): Query<OccupancyQuery>,
) -> AppResult<Json<OccupancyDetail>> {
    let detail = manager(&state)
        .estimate(query.space_id, query.record_id, time::now_millis())
        .await?;
    Ok(Json(detail))
}

/// GET /api/sessions - 台账列表 (搜索 + 统计)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<SessionListResponse>> {
    let records_repo = ParkingRecordRepository::new(state.db.clone());
    let payments_repo = PaymentRepository::new(state.db.clone());
    let tz = state.tz();
    let now = time::now_millis();

    let details = records_repo.find_recent(query.q).await?;

    // 已结清金额按记录一次性取出
    let record_refs: Vec<RecordId> = details.iter().filter_map(|d| d.id.clone()).collect();
    let payments = payments_repo.find_by_records(record_refs).await?;

    let records = details
        .into_iter()
        .map(|detail| {
            let end = detail.exited_at.unwrap_or(now);
            let duration =
                crate::billing::ElapsedBreakdown::between(detail.entered_at, end).display();
            let paid_amount = payments
                .iter()
                .find(|p| {
                    detail.id.as_ref() == Some(&p.record)
                        && p.status == crate::db::models::PaymentStatus::Paid
                })
                .map(|p| p.amount);
            SessionListItem {
                record: detail,
                duration,
                paid_amount,
            }
        })
        .collect();

    let today = time::today(tz);
    let exits_today = records_repo
        .count_exited_between(
            time::day_start_millis(today, tz),
            time::day_end_millis(today, tz),
        )
        .await?;

    Ok(Json(SessionListResponse {
        records,
        vehicles_inside: records_repo.count_open().await?,
        exits_today,
        total_records: records_repo.count_all().await?,
    }))
}
