//! Database Models

pub mod serde_helpers;

pub mod coupon;
pub mod floor;
pub mod parking_record;
pub mod payment;
pub mod reservation;
pub mod space;
pub mod space_type;
pub mod tariff;
pub mod user_account;
pub mod vehicle;

pub use coupon::{AppliedCoupon, Coupon, CouponCreate, CouponKind, CouponUpdate};
pub use floor::{Floor, FloorCreate, FloorUpdate};
pub use parking_record::ParkingRecord;
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use reservation::{Reservation, ReservationCreate, ReservationStatus, ReservationUpdate};
pub use space::{Space, SpaceCreate, SpaceRangeCreate, SpaceStatus, SpaceUpdate};
pub use space_type::{SpaceType, SpaceTypeCreate, SpaceTypeUpdate};
pub use tariff::{Tariff, TariffCreate, TariffUpdate};
pub use user_account::{Role, UserAccount, UserAccountCreate, UserAccountUpdate};
pub use vehicle::{Vehicle, VehicleCreate, VehicleKind, VehicleUpdate};
