use super::*;
use crate::db::DbService;
use crate::db::models::{
    CouponCreate, CouponKind, FloorCreate, PaymentMethod, PaymentStatus, SpaceCreate,
    SpaceStatus, SpaceType, SpaceTypeCreate, SpaceUpdate, TariffCreate,
};
use crate::db::repository::{
    CouponRepository, FloorRepository, PaymentRepository, SpaceRepository, SpaceTypeRepository,
    TariffRepository,
};
use crate::utils::AppError;

const MIN: i64 = 60 * 1000;
const HOUR: i64 = 60 * MIN;
const DAY: i64 = 24 * HOUR;

/// Fixed base timestamp so the arithmetic is reproducible
const T0: i64 = 1_750_000_000_000;

struct Fixture {
    db: surrealdb::Surreal<surrealdb::engine::local::Db>,
    manager: SessionManager,
    spaces: SpaceRepository,
    coupons: CouponRepository,
    tariffs: TariffRepository,
    space_type: SpaceType,
    space_id: String,
}

/// Build an in-memory registry: one floor, one type, one space, one tariff
async fn setup_with_price(hourly_price: f64) -> Fixture {
    let db = DbService::memory().await.expect("in-memory db").db;
    let tz: chrono_tz::Tz = "America/Bogota".parse().unwrap();

    let floors = FloorRepository::new(db.clone());
    let types = SpaceTypeRepository::new(db.clone());
    let spaces = SpaceRepository::new(db.clone());
    let tariffs = TariffRepository::new(db.clone());
    let coupons = CouponRepository::new(db.clone());

    let floor = floors
        .create(FloorCreate {
            name: "Level 1".to_string(),
            is_active: None,
        })
        .await
        .expect("floor");
    let space_type = types
        .create(SpaceTypeCreate {
            name: "Standard".to_string(),
        })
        .await
        .expect("space type");

    let space = spaces
        .create(SpaceCreate {
            number: "A-01".to_string(),
            floor: floor.id.clone().unwrap(),
            space_type: space_type.id.clone().unwrap(),
            status: None,
        })
        .await
        .expect("space");

    tariffs
        .create(TariffCreate {
            name: "Base rate".to_string(),
            space_type: space_type.id.clone().unwrap(),
            hourly_price,
            daily_price: hourly_price * 20.0,
            monthly_price: hourly_price * 400.0,
            is_active: None,
            valid_from: "2000-01-01".to_string(),
            valid_until: None,
        })
        .await
        .expect("tariff");

    let space_ref = space.id.clone().unwrap();
    Fixture {
        db: db.clone(),
        manager: SessionManager::new(db, tz),
        spaces,
        coupons,
        tariffs,
        space_type,
        space_id: space_ref.to_string(),
    }
}

async fn setup() -> Fixture {
    setup_with_price(5000.0).await
}

fn check_in_request(plate: &str, space_id: &str) -> CheckInRequest {
    CheckInRequest {
        plate: plate.to_string(),
        space_id: space_id.to_string(),
        contact_name: Some("Walk-in".to_string()),
        contact_phone: None,
    }
}

async fn make_coupon(fx: &Fixture, name: &str, kind: CouponKind, value: f64) {
    fx.coupons
        .create(CouponCreate {
            name: name.to_string(),
            kind,
            value,
            description: None,
            valid_from: "2000-01-01".to_string(),
            valid_until: "2100-01-01".to_string(),
            is_active: None,
        })
        .await
        .expect("coupon");
}

#[tokio::test]
async fn test_check_in_marks_space_occupied() {
    let fx = setup().await;

    let outcome = fx
        .manager
        .check_in(check_in_request("ABC123", &fx.space_id), T0)
        .await
        .expect("check-in");
    assert_eq!(outcome.plate, "ABC123");
    assert!(outcome.record.is_open());

    let space = fx.spaces.find_by_id(&fx.space_id).await.unwrap().unwrap();
    assert_eq!(space.status, SpaceStatus::Occupied);
}

#[tokio::test]
async fn test_five_minute_stay_bills_one_hour_and_frees_space() {
    let fx = setup().await;
    fx.manager
        .check_in(check_in_request("ABC123", &fx.space_id), T0)
        .await
        .expect("check-in");

    let outcome = fx
        .manager
        .check_out(
            CheckOutTarget::Space(fx.space_id.clone()),
            PaymentMethod::Pse,
            None,
            T0 + 5 * MIN,
        )
        .await
        .expect("check-out");

    let payment = outcome.payment.expect("payment created");
    assert_eq!(payment.amount, 5000.0);
    assert_eq!(payment.status, PaymentStatus::Paid);
    assert_eq!(outcome.fee.unwrap().billable_hours, 1);
    assert!(outcome.warnings.is_empty());

    let space = fx.spaces.find_by_id(&fx.space_id).await.unwrap().unwrap();
    assert_eq!(space.status, SpaceStatus::Available);
}

#[tokio::test]
async fn test_multi_day_stay_bills_ceiling_hours() {
    let fx = setup_with_price(2000.0).await;
    fx.manager
        .check_in(check_in_request("DEF456", &fx.space_id), T0)
        .await
        .expect("check-in");

    // 59h30m → 2*24 + 11 + 1 = 60 billable hours
    let outcome = fx
        .manager
        .check_out(
            CheckOutTarget::Space(fx.space_id.clone()),
            PaymentMethod::Card,
            None,
            T0 + 2 * DAY + 11 * HOUR + 30 * MIN,
        )
        .await
        .expect("check-out");

    let fee = outcome.fee.expect("fee");
    assert_eq!(fee.billable_hours, 60);
    assert_eq!(outcome.payment.unwrap().amount, 120000.0);
}

#[tokio::test]
async fn test_cash_checkout_stays_pending() {
    let fx = setup().await;
    fx.manager
        .check_in(check_in_request("ABC123", &fx.space_id), T0)
        .await
        .expect("check-in");

    let outcome = fx
        .manager
        .check_out(
            CheckOutTarget::Space(fx.space_id.clone()),
            PaymentMethod::Cash,
            None,
            T0 + 10 * MIN,
        )
        .await
        .expect("check-out");

    assert_eq!(outcome.payment.unwrap().status, PaymentStatus::Pending);
}

#[tokio::test]
async fn test_settle_flips_pending_cash_to_paid() {
    let fx = setup().await;
    fx.manager
        .check_in(check_in_request("ABC123", &fx.space_id), T0)
        .await
        .expect("check-in");

    let outcome = fx
        .manager
        .check_out(
            CheckOutTarget::Space(fx.space_id.clone()),
            PaymentMethod::Cash,
            None,
            T0 + 10 * MIN,
        )
        .await
        .expect("check-out");
    let payment_id = outcome.payment.unwrap().id.unwrap().to_string();

    let payments = PaymentRepository::new(fx.db.clone());
    let settled = payments.settle(&payment_id).await.expect("settle");
    assert_eq!(settled.status, PaymentStatus::Paid);

    // Settling twice misses the conditional update
    assert!(payments.settle(&payment_id).await.is_err());
}

#[tokio::test]
async fn test_percentage_coupon_discounts_fee() {
    let fx = setup().await;
    make_coupon(&fx, "SAVE20", CouponKind::Percentage, 20.0).await;

    fx.manager
        .check_in(check_in_request("ABC123", &fx.space_id), T0)
        .await
        .expect("check-in");

    let outcome = fx
        .manager
        .check_out(
            CheckOutTarget::Space(fx.space_id.clone()),
            PaymentMethod::Pse,
            Some("save20".to_string()), // code match is case-insensitive
            T0 + 5 * MIN,
        )
        .await
        .expect("check-out");

    assert_eq!(outcome.discount, 1000.0);
    let payment = outcome.payment.expect("payment");
    assert_eq!(payment.amount, 4000.0);

    // discount trace persisted against the payment
    let total = fx
        .coupons
        .discount_total_for_payment(payment.id.as_ref().unwrap())
        .await
        .unwrap();
    assert_eq!(total, 1000.0);
}

#[tokio::test]
async fn test_fixed_coupon_caps_at_fee() {
    let fx = setup().await;
    make_coupon(&fx, "BIGFIXED", CouponKind::FixedAmount, 8000.0).await;

    fx.manager
        .check_in(check_in_request("ABC123", &fx.space_id), T0)
        .await
        .expect("check-in");

    let outcome = fx
        .manager
        .check_out(
            CheckOutTarget::Space(fx.space_id.clone()),
            PaymentMethod::Pse,
            Some("BIGFIXED".to_string()),
            T0 + 5 * MIN,
        )
        .await
        .expect("check-out");

    // fee 5000, fixed 8000 → discount capped, final 0
    assert_eq!(outcome.discount, 5000.0);
    assert_eq!(outcome.payment.unwrap().amount, 0.0);
}

#[tokio::test]
async fn test_unknown_coupon_charges_full_fee_with_warning() {
    let fx = setup().await;
    fx.manager
        .check_in(check_in_request("ABC123", &fx.space_id), T0)
        .await
        .expect("check-in");

    let outcome = fx
        .manager
        .check_out(
            CheckOutTarget::Space(fx.space_id.clone()),
            PaymentMethod::Pse,
            Some("NOPE".to_string()),
            T0 + 5 * MIN,
        )
        .await
        .expect("check-out");

    assert_eq!(outcome.discount, 0.0);
    assert_eq!(outcome.payment.unwrap().amount, 5000.0);
    assert!(outcome.warnings.iter().any(|w| w.contains("NOPE")));
}

#[tokio::test]
async fn test_second_checkout_of_same_record_rejected() {
    let fx = setup().await;
    let check_in = fx
        .manager
        .check_in(check_in_request("ABC123", &fx.space_id), T0)
        .await
        .expect("check-in");
    let record_id = check_in.record.id.unwrap().to_string();

    fx.manager
        .check_out(
            CheckOutTarget::Record(record_id.clone()),
            PaymentMethod::Pse,
            None,
            T0 + 5 * MIN,
        )
        .await
        .expect("first check-out");

    let err = fx
        .manager
        .check_out(
            CheckOutTarget::Record(record_id),
            PaymentMethod::Pse,
            None,
            T0 + 10 * MIN,
        )
        .await
        .expect_err("second check-out must fail");
    assert!(matches!(err, AppError::BusinessRule(_)));
}

#[tokio::test]
async fn test_checkout_of_space_without_record_frees_it() {
    let fx = setup().await;

    // Mark the space occupied without opening a ledger record
    fx.spaces
        .update(
            &fx.space_id,
            SpaceUpdate {
                number: None,
                floor: None,
                space_type: None,
                status: Some(SpaceStatus::Occupied),
            },
        )
        .await
        .expect("force occupied");

    let outcome = fx
        .manager
        .check_out(
            CheckOutTarget::Space(fx.space_id.clone()),
            PaymentMethod::Cash,
            None,
            T0,
        )
        .await
        .expect("recovery path");

    assert!(outcome.payment.is_none());
    assert!(outcome.record.is_none());
    assert!(!outcome.warnings.is_empty());

    let space = fx.spaces.find_by_id(&fx.space_id).await.unwrap().unwrap();
    assert_eq!(space.status, SpaceStatus::Available);
}

#[tokio::test]
async fn test_check_in_rejected_on_occupied_space() {
    let fx = setup().await;
    fx.manager
        .check_in(check_in_request("ABC123", &fx.space_id), T0)
        .await
        .expect("first check-in");

    let err = fx
        .manager
        .check_in(check_in_request("XYZ789", &fx.space_id), T0 + MIN)
        .await
        .expect_err("occupied space must reject");
    assert!(matches!(err, AppError::BusinessRule(_)));
}

#[tokio::test]
async fn test_check_in_rejected_while_vehicle_inside() {
    let fx = setup().await;
    fx.manager
        .check_in(check_in_request("ABC123", &fx.space_id), T0)
        .await
        .expect("first check-in");

    // Second space, same plate
    let floor_repo = FloorRepository::new(fx.db.clone());
    let floors = floor_repo.find_all().await.unwrap();
    let second = fx
        .spaces
        .create(SpaceCreate {
            number: "A-02".to_string(),
            floor: floors[0].id.clone().unwrap(),
            space_type: fx.space_type.id.clone().unwrap(),
            status: None,
        })
        .await
        .expect("second space");

    let err = fx
        .manager
        .check_in(
            check_in_request("ABC123", &second.id.unwrap().to_string()),
            T0 + MIN,
        )
        .await
        .expect_err("vehicle already inside must reject");
    assert!(matches!(err, AppError::BusinessRule(_)));
}

#[tokio::test]
async fn test_no_tariff_checkout_records_no_payment() {
    let fx = setup().await;

    // Deactivate the only tariff
    let tariff = fx.tariffs.find_all().await.unwrap().remove(0);
    fx.tariffs
        .toggle(&tariff.id.unwrap().to_string())
        .await
        .expect("deactivate");

    fx.manager
        .check_in(check_in_request("ABC123", &fx.space_id), T0)
        .await
        .expect("check-in");

    let outcome = fx
        .manager
        .check_out(
            CheckOutTarget::Space(fx.space_id.clone()),
            PaymentMethod::Cash,
            None,
            T0 + 5 * MIN,
        )
        .await
        .expect("check-out");

    assert!(outcome.payment.is_none());
    assert!(outcome.warnings.iter().any(|w| w.contains("tariff")));

    let space = fx.spaces.find_by_id(&fx.space_id).await.unwrap().unwrap();
    assert_eq!(space.status, SpaceStatus::Available);
}

#[tokio::test]
async fn test_second_active_tariff_rejected() {
    let fx = setup().await;

    let err = fx
        .tariffs
        .create(TariffCreate {
            name: "Competing rate".to_string(),
            space_type: fx.space_type.id.clone().unwrap(),
            hourly_price: 9000.0,
            daily_price: 90000.0,
            monthly_price: 900000.0,
            is_active: None,
            valid_from: "2000-01-01".to_string(),
            valid_until: None,
        })
        .await
        .expect_err("second active tariff must reject");
    assert!(matches!(
        err,
        crate::db::repository::RepoError::Duplicate(_)
    ));
}

#[tokio::test]
async fn test_estimate_reports_duration_and_amount() {
    let fx = setup().await;
    fx.manager
        .check_in(check_in_request("ABC123", &fx.space_id), T0)
        .await
        .expect("check-in");

    let detail = fx
        .manager
        .estimate(Some(fx.space_id.clone()), None, T0 + HOUR + 5 * MIN)
        .await
        .expect("estimate");

    assert_eq!(detail.plate, "ABC123");
    assert_eq!(detail.duration, "1h 5m");
    // 1h05m → 2 billable hours at 5000
    assert_eq!(detail.estimated_amount, 10000.0);
    assert!(detail.tariff_info.is_some());
    assert_eq!(detail.contact_name.as_deref(), Some("Walk-in"));
}
