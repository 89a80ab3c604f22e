//! Payment API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::{Payment, PaymentStatus};
use crate::db::repository::payment::PaymentDetail;
use crate::db::repository::{CouponRepository, PaymentRepository};
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<PaymentStatus>,
    pub q: Option<String>,
}

/// Payment row with the discount trace summed in
#[derive(Debug, Serialize)]
pub struct PaymentListItem {
    #[serde(flatten)]
    pub payment: PaymentDetail,
    pub discount: f64,
}

#[derive(Debug, Serialize)]
pub struct PaymentListResponse {
    pub payments: Vec<PaymentListItem>,
    pub total_collected: f64,
    pub paid_count: i64,
    pub pending_count: i64,
}

/// GET /api/payments - 支付列表 (状态过滤 + 车牌搜索 + 统计)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<PaymentListResponse>> {
    let repo = PaymentRepository::new(state.db.clone());
    let coupons = CouponRepository::new(state.db.clone());

    let details = repo.find_filtered(query.status, query.q).await?;

    let mut payments = Vec::with_capacity(details.len());
    for detail in details {
        let discount = match detail.id.as_ref() {
            Some(id) => coupons.discount_total_for_payment(id).await?,
            None => 0.0,
        };
        payments.push(PaymentListItem {
            payment: detail,
            discount,
        });
    }

    Ok(Json(PaymentListResponse {
        payments,
        total_collected: repo.sum_paid_total().await?,
        paid_count: repo.count_status(PaymentStatus::Paid).await?,
        pending_count: repo.count_status(PaymentStatus::Pending).await?,
    }))
}

/// POST /api/payments/:id/settle - 结清 PENDING 现金支付
pub async fn settle(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Payment>> {
    let repo = PaymentRepository::new(state.db.clone());
    let payment = repo.settle(&id).await?;
    tracing::info!(payment = %id, amount = payment.amount, "Payment settled");
    Ok(Json(payment))
}
