//! Coupon Repository

use super::{BaseRepository, RepoError, RepoResult, SumRow};
use crate::db::models::{AppliedCoupon, Coupon, CouponCreate, CouponUpdate};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "coupon";
const APPLIED_TABLE: &str = "applied_coupon";

#[derive(Clone)]
pub struct CouponRepository {
    base: BaseRepository,
}

impl CouponRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all coupons, active first
    pub async fn find_all(&self) -> RepoResult<Vec<Coupon>> {
        let coupons: Vec<Coupon> = self
            .base
            .db()
            .query("SELECT * FROM coupon ORDER BY is_active DESC, name")
            .await?
            .take(0)?;
        Ok(coupons)
    }

    /// Find coupons redeemable today (active + within window)
    pub async fn find_available(&self, today: &str) -> RepoResult<Vec<Coupon>> {
        let coupons: Vec<Coupon> = self
            .base
            .db()
            .query(
                "SELECT * FROM coupon WHERE is_active = true \
                 AND valid_from <= $today AND valid_until >= $today ORDER BY name",
            )
            .bind(("today", today.to_string()))
            .await?
            .take(0)?;
        Ok(coupons)
    }

    /// Find coupon by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Coupon>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let coupon: Option<Coupon> = self.base.db().select(thing).await?;
        Ok(coupon)
    }

    /// Find coupon by redeem code (case-insensitive name match)
    pub async fn find_by_code(&self, code: &str) -> RepoResult<Option<Coupon>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM coupon WHERE string::lowercase(name) = string::lowercase($code) LIMIT 1")
            .bind(("code", code.trim().to_string()))
            .await?;
        let coupons: Vec<Coupon> = result.take(0)?;
        Ok(coupons.into_iter().next())
    }

    /// Create a new coupon
    pub async fn create(&self, data: CouponCreate) -> RepoResult<Coupon> {
        let coupon = Coupon {
            id: None,
            name: data.name,
            kind: data.kind,
            value: data.value,
            description: data.description.unwrap_or_default(),
            valid_from: data.valid_from,
            valid_until: data.valid_until,
            is_active: data.is_active.unwrap_or(true),
        };

        let created: Option<Coupon> = self.base.db().create(TABLE).content(coupon).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create coupon".to_string()))
    }

    /// Update a coupon
    pub async fn update(&self, id: &str, data: CouponUpdate) -> RepoResult<Coupon> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Coupon {} not found", id)))?;

        let name = data.name.unwrap_or(existing.name);
        let kind = data.kind.unwrap_or(existing.kind);
        let value = data.value.unwrap_or(existing.value);
        let description = data.description.unwrap_or(existing.description);
        let valid_from = data.valid_from.unwrap_or(existing.valid_from);
        let valid_until = data.valid_until.unwrap_or(existing.valid_until);
        let is_active = data.is_active.unwrap_or(existing.is_active);

        self.base
            .db()
            .query("UPDATE $thing SET name = $name, kind = $kind, value = $value, description = $description, valid_from = $valid_from, valid_until = $valid_until, is_active = $is_active")
            .bind(("thing", thing))
            .bind(("name", name))
            .bind(("kind", kind))
            .bind(("value", value))
            .bind(("description", description))
            .bind(("valid_from", valid_from))
            .bind(("valid_until", valid_until))
            .bind(("is_active", is_active))
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Coupon {} not found", id)))
    }

    /// Hard delete a coupon
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }

    // ── Applied coupons (discount trace) ────────────────────────────

    /// Record a coupon application against a payment
    pub async fn create_applied(
        &self,
        payment: RecordId,
        coupon: RecordId,
        discounted_amount: f64,
    ) -> RepoResult<AppliedCoupon> {
        // CREATE via query so payment/coupon are stored as record links
        let created: Vec<AppliedCoupon> = self
            .base
            .db()
            .query(format!(
                "CREATE {APPLIED_TABLE} SET payment = $payment, coupon = $coupon, discounted_amount = $discounted_amount"
            ))
            .bind(("payment", payment))
            .bind(("coupon", coupon))
            .bind(("discounted_amount", discounted_amount))
            .await?
            .take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to record applied coupon".to_string()))
    }

    /// Total discount recorded against one payment
    pub async fn discount_total_for_payment(&self, payment: &RecordId) -> RepoResult<f64> {
        let row: Option<SumRow> = self
            .base
            .db()
            .query("SELECT math::sum(discounted_amount) AS total FROM applied_coupon WHERE payment = $payment GROUP ALL")
            .bind(("payment", payment.clone()))
            .await?
            .take(0)?;
        Ok(row.map(|r| r.total).unwrap_or(0.0))
    }
}
