use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotFeatures {
    pub covered: bool,
    pub ev_charging: bool,
    pub max_height_cm: Option<i32>,
}

/// Owner-supplied description of a parking spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingSpot {
    pub location: Location,
    pub features: SpotFeatures,
    pub price_per_hour: Decimal,
}

/// A stored parking spot: the description plus its identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotEntry {
    #[serde(skip)]
    pub id: i64,
    pub uuid: Uuid,
    #[serde(skip)]
    pub owner_id: i64,
    pub spot: ParkingSpot,
}

impl SpotEntry {
    pub fn spot(&self) -> &ParkingSpot {
        &self.spot
    }

    pub fn location(&self) -> &Location {
        &self.spot.location
    }

    pub fn price_per_hour(&self) -> Decimal {
        self.spot.price_per_hour
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }
}
