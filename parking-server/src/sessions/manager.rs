//! Session Manager
//!
//! 进出场流程编排：车位登记 → 占用台账 → 费率查找 → 计费 →
//! 折扣 → 支付落库 → 车位释放。所有拒绝都以用户可读消息返回，
//! 非致命问题 (无效优惠券、缺失费率) 作为 warnings 附在成功响应里。

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use crate::billing::{self, FeeQuote};
use crate::db::models::{
    Coupon, ParkingRecord, Payment, PaymentMethod, PaymentStatus, SpaceStatus, VehicleCreate,
};
use crate::db::repository::{
    CouponRepository, ParkingRecordRepository, PaymentRepository, SpaceRepository,
    SpaceTypeRepository, TariffRepository, UserAccountRepository, VehicleRepository,
};
use crate::utils::{AppError, AppResult, time};

/// Check-in request
#[derive(Debug, Clone, Deserialize)]
pub struct CheckInRequest {
    pub plate: String,
    pub space_id: String,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
}

/// Check-in outcome
#[derive(Debug, Clone, Serialize)]
pub struct CheckInOutcome {
    pub record: ParkingRecord,
    pub plate: String,
    pub space_number: String,
    pub message: String,
}

/// Check-out target: a space, a specific record, or the caller's own session
#[derive(Debug, Clone)]
pub enum CheckOutTarget {
    Space(String),
    Record(String),
    Owner(RecordId),
}

/// Check-out outcome
///
/// `record`/`payment` 为空的组合表示恢复路径：
/// 车位被标记 OCCUPIED 但没有打开的台账记录时，强制释放车位。
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<ParkingRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<Payment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<FeeQuote>,
    pub discount: f64,
    pub warnings: Vec<String>,
    pub message: String,
}

/// Live occupancy detail with an in-progress fee estimate
#[derive(Debug, Clone, Serialize)]
pub struct OccupancyDetail {
    pub record_id: String,
    pub plate: String,
    pub space_id: String,
    pub space_number: String,
    pub space_type: String,
    pub entered_at: i64,
    pub entered_display: String,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    /// e.g. "$5000 / hour", absent when no tariff is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tariff_info: Option<String>,
    pub estimated_amount: f64,
}

/// Orchestrates entry/exit transitions over the repositories
#[derive(Clone)]
pub struct SessionManager {
    spaces: SpaceRepository,
    space_types: SpaceTypeRepository,
    vehicles: VehicleRepository,
    records: ParkingRecordRepository,
    tariffs: TariffRepository,
    coupons: CouponRepository,
    payments: PaymentRepository,
    accounts: UserAccountRepository,
    tz: Tz,
}

impl SessionManager {
    pub fn new(db: Surreal<Db>, tz: Tz) -> Self {
        Self {
            spaces: SpaceRepository::new(db.clone()),
            space_types: SpaceTypeRepository::new(db.clone()),
            vehicles: VehicleRepository::new(db.clone()),
            records: ParkingRecordRepository::new(db.clone()),
            tariffs: TariffRepository::new(db.clone()),
            coupons: CouponRepository::new(db.clone()),
            payments: PaymentRepository::new(db.clone()),
            accounts: UserAccountRepository::new(db),
            tz,
        }
    }

    /// Register a vehicle entry
    ///
    /// 未注册车牌自动建档为访客车辆。
    pub async fn check_in(&self, req: CheckInRequest, now: i64) -> AppResult<CheckInOutcome> {
        let plate = req.plate.trim().to_uppercase();
        if plate.is_empty() {
            return Err(AppError::validation("Plate is required"));
        }

        // 1. Validate the space
        let space = self
            .spaces
            .find_by_id(&req.space_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Space {} not found", req.space_id)))?;
        if space.status != SpaceStatus::Available {
            return Err(AppError::business_rule(format!(
                "Space {} is not available",
                space.number
            )));
        }
        let space_ref = space
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Space record without id"))?;

        // 2. Find or register the vehicle
        let vehicle = match self.vehicles.find_by_plate(&plate).await? {
            Some(v) => {
                // 访客车辆进场时更新联系人信息
                if v.is_visitor
                    && (req.contact_name.is_some() || req.contact_phone.is_some())
                    && let Some(id) = v.id.as_ref()
                {
                    self.vehicles
                        .update_contact(id, req.contact_name.clone(), req.contact_phone.clone())
                        .await?;
                }
                v
            }
            None => {
                self.vehicles
                    .create(VehicleCreate {
                        plate: plate.clone(),
                        kind: None,
                        color: None,
                        brand: None,
                        model: None,
                        owner: None,
                        is_visitor: Some(true),
                        contact_name: req.contact_name.clone(),
                        contact_phone: req.contact_phone.clone(),
                    })
                    .await?
            }
        };
        let vehicle_ref = vehicle
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Vehicle record without id"))?;

        // 3. One open session per vehicle
        if self
            .records
            .find_open_by_vehicle(&vehicle_ref)
            .await?
            .is_some()
        {
            return Err(AppError::business_rule(format!(
                "Vehicle {} already has an active session",
                plate
            )));
        }

        // 4. Claim the space (conditional update settles concurrent check-ins)
        if !self.spaces.try_occupy(&space_ref).await? {
            return Err(AppError::business_rule(format!(
                "Space {} is not available",
                space.number
            )));
        }

        // 5. Open the ledger record; roll the space back if that write fails
        let record = match self
            .records
            .create(vehicle_ref, space_ref.clone(), now)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                let _ = self.spaces.release(&space_ref).await;
                return Err(e.into());
            }
        };

        tracing::info!(plate = %plate, space = %space.number, "Vehicle checked in");

        Ok(CheckInOutcome {
            record,
            plate: plate.clone(),
            space_number: space.number.clone(),
            message: format!("Check-in recorded for {} at {}", plate, space.number),
        })
    }

    /// Register a vehicle exit, bill it and free the space
    pub async fn check_out(
        &self,
        target: CheckOutTarget,
        method: PaymentMethod,
        coupon_code: Option<String>,
        now: i64,
    ) -> AppResult<CheckOutOutcome> {
        let mut warnings: Vec<String> = Vec::new();

        // 1. Resolve the open record
        let record = match target {
            CheckOutTarget::Record(id) => {
                let record = self
                    .records
                    .find_by_id(&id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Parking record {} not found", id)))?;
                if !record.is_open() {
                    return Err(AppError::business_rule(
                        "Parking session is already closed".to_string(),
                    ));
                }
                record
            }
            CheckOutTarget::Space(id) => {
                let space = self
                    .spaces
                    .find_by_id(&id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Space {} not found", id)))?;
                if space.status != SpaceStatus::Occupied {
                    return Err(AppError::business_rule(format!(
                        "Space {} is not occupied",
                        space.number
                    )));
                }
                let space_ref = space
                    .id
                    .clone()
                    .ok_or_else(|| AppError::internal("Space record without id"))?;

                match self.records.find_open_by_space(&space_ref).await? {
                    Some(record) => record,
                    None => {
                        // 台账没有打开的记录：强制释放车位，不产生支付
                        self.spaces.release(&space_ref).await?;
                        tracing::warn!(space = %space.number, "Occupied space had no open record; released");
                        return Ok(CheckOutOutcome {
                            record: None,
                            payment: None,
                            fee: None,
                            discount: 0.0,
                            warnings: vec![format!(
                                "Space {} released (no active record found)",
                                space.number
                            )],
                            message: format!("Space {} released", space.number),
                        });
                    }
                }
            }
            CheckOutTarget::Owner(owner) => self
                .records
                .find_open_by_owner(&owner)
                .await?
                .ok_or_else(|| {
                    AppError::not_found("You have no vehicle currently parked".to_string())
                })?,
        };

        let record_ref = record
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Parking record without id"))?;

        // 2. Close the record (conditional update: a second check-out misses)
        let closed = self
            .records
            .close(&record_ref, now)
            .await?
            .ok_or_else(|| {
                AppError::business_rule("Parking session is already closed".to_string())
            })?;

        let space = self.spaces.find_by_id(&closed.space.to_string()).await?;
        let vehicle = self.vehicles.find_by_id(&closed.vehicle.to_string()).await?;
        let plate = vehicle
            .as_ref()
            .map(|v| v.plate.clone())
            .unwrap_or_else(|| closed.vehicle.to_string());

        // 3. Billing: tariff lookup gates on active flag + validity window
        let today = time::today_str(self.tz);
        let tariff = match &space {
            Some(s) => self.tariffs.find_usable_for_type(&s.space_type, &today).await?,
            None => {
                warnings.push("Space no longer exists; no charge recorded".to_string());
                None
            }
        };

        let mut fee: Option<FeeQuote> = None;
        let mut payment: Option<Payment> = None;
        let mut discount_amount = 0.0;

        match tariff {
            Some(tariff) => {
                let q = billing::quote(closed.entered_at, now, tariff.hourly_price);

                // 4. Optional coupon discount
                let mut applied_coupon: Option<Coupon> = None;
                if let Some(code) = coupon_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
                    match self.coupons.find_by_code(code).await? {
                        Some(coupon) if billing::discount::is_eligible(&coupon, &today) => {
                            discount_amount = billing::discount::discount_for(&coupon, q.amount);
                            applied_coupon = Some(coupon);
                        }
                        _ => {
                            warnings.push(format!(
                                "Coupon \"{}\" is not valid or has expired",
                                code
                            ));
                        }
                    }
                }

                let final_amount = billing::discount::apply(q.amount, discount_amount);

                // 5. Record the payment (cash settles later at the cashier)
                let status = match method {
                    PaymentMethod::Cash => PaymentStatus::Pending,
                    _ => PaymentStatus::Paid,
                };
                let created = self
                    .payments
                    .create(final_amount, method, status, record_ref.clone(), now)
                    .await?;

                if let Some(coupon) = applied_coupon
                    && discount_amount > 0.0
                    && let (Some(payment_id), Some(coupon_id)) = (created.id.clone(), coupon.id)
                {
                    self.coupons
                        .create_applied(payment_id, coupon_id, discount_amount)
                        .await?;
                }

                payment = Some(created);
                fee = Some(q);
            }
            None => {
                if space.is_some() {
                    warnings.push(
                        "No tariff configured for this space type; no charge recorded".to_string(),
                    );
                }
            }
        }

        // 6. Free the space regardless of payment status
        if let Some(space_ref) = space.as_ref().and_then(|s| s.id.clone()) {
            self.spaces.release(&space_ref).await?;
        }

        let message = match (&payment, &fee) {
            (Some(p), Some(_)) if p.status == PaymentStatus::Pending => format!(
                "Check-out recorded for {}. Payment of ${} registered (PENDING), settle at the cashier",
                plate, p.amount
            ),
            (Some(p), Some(_)) => format!(
                "Check-out recorded for {}. Payment of ${} processed",
                plate, p.amount
            ),
            _ => format!("Check-out recorded for {}", plate),
        };

        tracing::info!(
            plate = %plate,
            amount = payment.as_ref().map(|p| p.amount).unwrap_or(0.0),
            discount = discount_amount,
            "Vehicle checked out"
        );

        Ok(CheckOutOutcome {
            record: Some(closed),
            payment,
            fee,
            discount: discount_amount,
            warnings,
            message,
        })
    }

    /// Live detail of an open session, with an in-progress fee estimate
    pub async fn estimate(
        &self,
        space_id: Option<String>,
        record_id: Option<String>,
        now: i64,
    ) -> AppResult<OccupancyDetail> {
        let record = match (record_id, space_id) {
            (Some(id), _) => self
                .records
                .find_by_id(&id)
                .await?
                .filter(ParkingRecord::is_open)
                .ok_or_else(|| AppError::not_found("No active record".to_string()))?,
            (None, Some(id)) => {
                let space = self
                    .spaces
                    .find_by_id(&id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Space {} not found", id)))?;
                let space_ref = space
                    .id
                    .clone()
                    .ok_or_else(|| AppError::internal("Space record without id"))?;
                self.records
                    .find_open_by_space(&space_ref)
                    .await?
                    .ok_or_else(|| AppError::not_found("No active record".to_string()))?
            }
            (None, None) => {
                return Err(AppError::validation("space_id or record_id is required"));
            }
        };

        self.detail_for(record, now).await
    }

    /// Live detail of the caller's own open session
    pub async fn estimate_for_owner(&self, owner: &RecordId, now: i64) -> AppResult<OccupancyDetail> {
        let record = self
            .records
            .find_open_by_owner(owner)
            .await?
            .ok_or_else(|| {
                AppError::not_found("You have no vehicle currently parked".to_string())
            })?;
        self.detail_for(record, now).await
    }

    async fn detail_for(&self, record: ParkingRecord, now: i64) -> AppResult<OccupancyDetail> {
        let space = self
            .spaces
            .find_by_id(&record.space.to_string())
            .await?
            .ok_or_else(|| AppError::not_found("Space no longer exists".to_string()))?;
        let vehicle = self
            .vehicles
            .find_by_id(&record.vehicle.to_string())
            .await?
            .ok_or_else(|| AppError::not_found("Vehicle no longer exists".to_string()))?;

        let space_type_name = self
            .space_types
            .find_by_id(&space.space_type.to_string())
            .await?
            .map(|t| t.name)
            .unwrap_or_default();

        let (owner_name, owner_email) = match vehicle.owner.as_ref() {
            Some(owner) => match self.accounts.find_by_id(&owner.to_string()).await? {
                Some(account) => (Some(account.full_name), Some(account.email)),
                None => (None, None),
            },
            None => (None, None),
        };

        let elapsed = billing::ElapsedBreakdown::between(record.entered_at, now);

        let today = time::today_str(self.tz);
        let tariff = self
            .tariffs
            .find_usable_for_type(&space.space_type, &today)
            .await?;
        let (tariff_info, estimated_amount) = match tariff {
            Some(t) => {
                let q = billing::quote(record.entered_at, now, t.hourly_price);
                (Some(format!("${} / hour", t.hourly_price)), q.amount)
            }
            None => (None, 0.0),
        };

        let contact = vehicle.owner.is_none();
        Ok(OccupancyDetail {
            record_id: record
                .id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            plate: vehicle.plate,
            space_id: space
                .id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            space_number: space.number,
            space_type: space_type_name,
            entered_at: record.entered_at,
            entered_display: time::format_local(record.entered_at, self.tz),
            duration: elapsed.display(),
            owner_name,
            owner_email,
            contact_name: if contact { vehicle.contact_name } else { None },
            contact_phone: if contact { vehicle.contact_phone } else { None },
            tariff_info,
            estimated_amount,
        })
    }
}
