use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::time_unit::TimeSlot;

/// A confirmed reservation together with the units it claimed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(skip)]
    pub id: i64,
    pub uuid: Uuid,
    #[serde(skip)]
    pub buyer_id: i64,
    #[serde(skip)]
    pub seller_id: i64,
    #[serde(skip)]
    pub listing_id: i64,
    pub listing_uuid: Uuid,
    #[serde(skip)]
    pub car_id: i64,
    pub paid_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub booked_times: Vec<TimeSlot>,
}

impl Booking {
    /// Whether the user is the buyer or the owner of the booked listing.
    pub fn is_party(&self, user_id: i64) -> bool {
        self.buyer_id == user_id || self.seller_id == user_id
    }

    pub fn unit_count(&self) -> usize {
        self.booked_times.iter().map(TimeSlot::unit_count).sum()
    }
}
