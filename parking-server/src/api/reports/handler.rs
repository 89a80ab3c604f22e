//! Reporting API Handlers
//!
//! 仪表盘与周期报表。数据库只出行级数据，分桶/去重/占比在内存中完成。

use std::collections::HashSet;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Datelike, Duration};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::core::ServerState;
use crate::db::repository::reservation::ReservationDetail;
use crate::db::repository::{
    FloorRepository, ParkingRecordRepository, PaymentRepository, ReservationRepository,
    SpaceRepository,
};
use crate::utils::{AppResult, time};

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Entry histogram window (06:00–22:00)
const FIRST_HOUR: u32 = 6;
const LAST_HOUR: u32 = 23;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FloorOccupancy {
    pub id: String,
    pub name: String,
    pub total: i64,
    pub occupied: i64,
    pub percentage: i64,
}

#[derive(Debug, Serialize)]
pub struct DayRevenuePoint {
    /// e.g. "Tue 10"
    pub label: String,
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct HourEntryPoint {
    /// e.g. "6:00"
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub total_spaces: i64,
    pub available: i64,
    pub occupied: i64,
    pub inactive: i64,
    pub vehicles_inside: i64,
    pub active_reservations: i64,
    pub floors: Vec<FloorOccupancy>,
    pub revenue_week: Vec<DayRevenuePoint>,
    pub entries_today: Vec<HourEntryPoint>,
    pub recent_reservations: Vec<ReservationDetail>,
}

#[derive(Debug, Serialize)]
pub struct FloorReport {
    pub name: String,
    pub occupancy_pct: i64,
    pub revenue: f64,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub period_days: i64,
    pub occupancy_pct: i64,
    pub entries: i64,
    pub entries_variation_pct: i64,
    pub revenue: f64,
    pub revenue_variation_pct: i64,
    pub distinct_vehicles: i64,
    pub vehicles_variation_pct: i64,
    pub daily_rotation: f64,
    pub registered_pct: i64,
    pub visitors_pct: i64,
    pub reservations_pct: i64,
    pub floors: Vec<FloorReport>,
}

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// week | month | year (default month)
    pub period: Option<String>,
    /// Floor id filter, all floors when absent
    pub floor: Option<String>,
}

fn variation_pct(current: i64, previous: i64) -> i64 {
    if previous > 0 {
        (current - previous) * 100 / previous
    } else {
        0
    }
}

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/reports/dashboard - 运营仪表盘
pub async fn dashboard(State(state): State<ServerState>) -> AppResult<Json<DashboardResponse>> {
    let tz = state.tz();
    let spaces = SpaceRepository::new(state.db.clone());
    let floors_repo = FloorRepository::new(state.db.clone());
    let records = ParkingRecordRepository::new(state.db.clone());
    let payments = PaymentRepository::new(state.db.clone());
    let reservations = ReservationRepository::new(state.db.clone());

    let counts = spaces.status_counts().await?;

    // 各楼层占用率 (仅活跃楼层)
    let mut floor_stats = Vec::new();
    for floor in floors_repo.find_active().await? {
        let Some(floor_ref) = floor.id.clone() else {
            continue;
        };
        let total = floors_repo.count_spaces(&floor_ref, None).await?;
        let occupied = floors_repo.count_spaces(&floor_ref, Some("OCCUPIED")).await?;
        floor_stats.push(FloorOccupancy {
            id: floor_ref.to_string(),
            name: floor.name,
            total,
            occupied,
            percentage: if total > 0 { occupied * 100 / total } else { 0 },
        });
    }

    // 最近 7 天已收款收入，按业务时区日期分桶
    let today = time::today(tz);
    let week_start = today - Duration::days(6);
    let rows = payments
        .paid_rows_with_floor_between(
            time::day_start_millis(week_start, tz),
            time::day_end_millis(today, tz),
        )
        .await?;

    let mut revenue_week = Vec::with_capacity(7);
    for offset in 0..7 {
        let day = week_start + Duration::days(offset);
        let start = time::day_start_millis(day, tz);
        let end = time::day_end_millis(day, tz);
        let amount: f64 = rows
            .iter()
            .filter(|r| r.paid_at >= start && r.paid_at < end)
            .map(|r| r.amount)
            .sum();
        revenue_week.push(DayRevenuePoint {
            label: format!(
                "{} {}",
                WEEKDAYS[day.weekday().num_days_from_monday() as usize],
                day.day()
            ),
            amount,
        });
    }

    // 今日进场按小时分桶 (06:00–22:00)
    let entries = records
        .find_entered_between(
            time::day_start_millis(today, tz),
            time::day_end_millis(today, tz),
        )
        .await?;
    let mut entries_today = Vec::new();
    for hour in FIRST_HOUR..LAST_HOUR {
        let count = entries
            .iter()
            .filter(|r| time::millis_to_local_hour(r.entered_at, tz) == hour)
            .count() as i64;
        entries_today.push(HourEntryPoint {
            label: format!("{}:00", hour),
            count,
        });
    }

    Ok(Json(DashboardResponse {
        total_spaces: counts.total,
        available: counts.available,
        occupied: counts.occupied,
        inactive: counts.inactive,
        vehicles_inside: records.count_open().await?,
        active_reservations: reservations.count_active().await?,
        floors: floor_stats,
        revenue_week,
        entries_today,
        recent_reservations: reservations.find_recent(5).await?,
    }))
}

/// GET /api/reports - 周期报表 (period=week|month|year, floor 过滤)
pub async fn reports(
    State(state): State<ServerState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ReportResponse>> {
    let tz = state.tz();
    let spaces = SpaceRepository::new(state.db.clone());
    let floors_repo = FloorRepository::new(state.db.clone());
    let records = ParkingRecordRepository::new(state.db.clone());
    let payments = PaymentRepository::new(state.db.clone());
    let reservations = ReservationRepository::new(state.db.clone());

    let period_days: i64 = match query.period.as_deref() {
        Some("week") => 7,
        Some("year") => 365,
        _ => 30,
    };
    let floor_filter: Option<RecordId> = query.floor.as_deref().and_then(|f| f.parse().ok());

    let now = time::now_millis();
    let start = now - period_days * DAY_MILLIS;
    let prev_start = start - period_days * DAY_MILLIS;

    // 占用率 (当前快照)
    let counts = spaces.status_counts().await?;
    let in_service = spaces.count_in_service().await?;
    let occupancy_pct = if in_service > 0 {
        counts.occupied * 100 / in_service
    } else {
        0
    };

    // 行级数据，楼层过滤在内存中完成
    let by_floor = |rows: Vec<crate::db::repository::parking_record::UsageRow>| {
        rows.into_iter()
            .filter(|r| {
                floor_filter
                    .as_ref()
                    .is_none_or(|f| r.floor.as_ref() == Some(f))
            })
            .collect::<Vec<_>>()
    };
    let current_rows = by_floor(records.usage_rows_between(start, now).await?);
    let previous_rows = by_floor(records.usage_rows_between(prev_start, start).await?);

    let entries = current_rows.len() as i64;
    let entries_prev = previous_rows.len() as i64;

    let distinct = |rows: &[crate::db::repository::parking_record::UsageRow]| {
        rows.iter()
            .map(|r| r.vehicle.to_string())
            .collect::<HashSet<_>>()
            .len() as i64
    };
    let distinct_vehicles = distinct(&current_rows);
    let distinct_prev = distinct(&previous_rows);

    // 收入 (全场，不按楼层过滤)
    let revenue = payments.sum_paid_between(start, now).await?;
    let revenue_prev = payments.sum_paid_between(prev_start, start).await?;

    // 轮转率: 每车位每天平均进场次数
    let daily_rotation = if in_service > 0 && period_days > 0 {
        ((entries as f64) / (in_service as f64) / (period_days as f64) * 10.0).round() / 10.0
    } else {
        0.0
    };

    // 使用分布: 注册车辆 / 访客 / 预约
    let registered = current_rows.iter().filter(|r| !r.is_visitor).count() as i64;
    let visitors = current_rows.iter().filter(|r| r.is_visitor).count() as i64;
    let start_date = time::millis_to_local_date(start, tz).format("%Y-%m-%d").to_string();
    let reservation_count = reservations.count_from_date(&start_date).await?;

    let total_usage = registered + visitors + reservation_count;
    let (registered_pct, visitors_pct, reservations_pct) = if total_usage > 0 {
        let r = registered * 100 / total_usage;
        let v = visitors * 100 / total_usage;
        (r, v, 100 - r - v)
    } else {
        (0, 0, 0)
    };

    // 各楼层: 占用率 + 收入
    let paid_rows = payments.paid_rows_with_floor_between(start, now).await?;
    let mut floor_reports = Vec::new();
    for floor in floors_repo.find_active().await? {
        let Some(floor_ref) = floor.id.clone() else {
            continue;
        };
        let total = floors_repo.count_spaces(&floor_ref, None).await?;
        let inactive = floors_repo.count_spaces(&floor_ref, Some("INACTIVE")).await?;
        let occupied = floors_repo.count_spaces(&floor_ref, Some("OCCUPIED")).await?;
        let in_service_floor = total - inactive;
        let revenue_floor: f64 = paid_rows
            .iter()
            .filter(|r| r.floor.as_ref() == Some(&floor_ref))
            .map(|r| r.amount)
            .sum();
        floor_reports.push(FloorReport {
            name: floor.name,
            occupancy_pct: if in_service_floor > 0 {
                occupied * 100 / in_service_floor
            } else {
                0
            },
            revenue: revenue_floor,
        });
    }

    Ok(Json(ReportResponse {
        period_days,
        occupancy_pct,
        entries,
        entries_variation_pct: variation_pct(entries, entries_prev),
        revenue,
        revenue_variation_pct: variation_pct(revenue as i64, revenue_prev as i64),
        distinct_vehicles,
        vehicles_variation_pct: variation_pct(distinct_vehicles, distinct_prev),
        daily_rotation,
        registered_pct,
        visitors_pct,
        reservations_pct,
        floors: floor_reports,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variation_pct() {
        assert_eq!(variation_pct(150, 100), 50);
        assert_eq!(variation_pct(50, 100), -50);
        assert_eq!(variation_pct(10, 0), 0);
    }
}
