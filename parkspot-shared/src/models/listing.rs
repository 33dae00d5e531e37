use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terms under which a spot is offered for rent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub price_per_hour: Decimal,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    #[serde(skip)]
    pub id: i64,
    pub uuid: Uuid,
    #[serde(skip)]
    pub spot_id: i64,
    pub spot_uuid: Uuid,
    #[serde(skip)]
    pub owner_id: i64,
    pub listing: Listing,
}

impl ListingEntry {
    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn price_per_hour(&self) -> Decimal {
        self.listing.price_per_hour
    }

    /// Active listings are visible to every caller.
    pub fn is_public(&self) -> bool {
        self.listing.active
    }
}
