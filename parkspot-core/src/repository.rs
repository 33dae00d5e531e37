use async_trait::async_trait;
use parkspot_shared::{
    Booking, Car, CarEntry, Listing, ListingEntry, ParkingSpot, SpotEntry, TimeSlot, UnitRange,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::identity::Resolve;
use crate::DomainResult;

/// Repository for parking spots. `resolve` reports a spot as public while it
/// has at least one active listing.
#[async_trait]
pub trait SpotRepository: Resolve {
    async fn create_spot(&self, owner_id: i64, spot: &ParkingSpot) -> DomainResult<SpotEntry>;

    async fn get_spot(&self, id: i64) -> DomainResult<Option<SpotEntry>>;

    /// Spots of `owner_id` with `id > after`, ascending, at most `limit`.
    async fn list_spots(&self, owner_id: i64, after: i64, limit: i64) -> DomainResult<Vec<SpotEntry>>;

    async fn delete_spot(&self, id: i64) -> DomainResult<()>;
}

/// Repository for listings. `resolve` reports a listing as public while it is
/// active; the owner is the owner of the underlying spot.
#[async_trait]
pub trait ListingRepository: Resolve {
    async fn create_listing(&self, spot_id: i64, owner_id: i64, listing: &Listing) -> DomainResult<ListingEntry>;

    async fn get_listing(&self, id: i64) -> DomainResult<Option<ListingEntry>>;

    async fn list_listings(&self, owner_id: i64, after: i64, limit: i64) -> DomainResult<Vec<ListingEntry>>;

    async fn set_active(&self, id: i64, active: bool) -> DomainResult<()>;

    async fn delete_listing(&self, id: i64) -> DomainResult<()>;
}

#[async_trait]
pub trait CarRepository: Resolve {
    async fn create_car(&self, owner_id: i64, car: &Car) -> DomainResult<CarEntry>;
}

/// The bookable unit grid of every listing.
#[async_trait]
pub trait TimeUnitRepository: Send + Sync {
    /// Inserts every unit of `slots` or none of them.
    async fn create_units(&self, listing_id: i64, slots: &[TimeSlot]) -> DomainResult<()>;

    async fn units_by_listing(&self, listing_id: i64) -> DomainResult<Vec<TimeSlot>>;

    async fn unbooked_units_by_listing(&self, listing_id: i64) -> DomainResult<Vec<TimeSlot>>;

    async fn units_by_booking(&self, booking_id: i64) -> DomainResult<Vec<TimeSlot>>;

    /// Deletes the unbooked units among `slots`. Fails with `NotFound` when
    /// nothing was deleted.
    async fn delete_units(&self, listing_id: i64, slots: &[TimeSlot]) -> DomainResult<()>;
}

/// Everything the allocator has decided before touching the store.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub uuid: Uuid,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub listing_id: i64,
    pub listing_uuid: Uuid,
    pub car_id: i64,
    pub paid_amount: Decimal,
    pub ranges: Vec<UnitRange>,
}

impl NewBooking {
    pub fn requested_units(&self) -> usize {
        self.ranges.iter().map(UnitRange::len).sum()
    }
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Claims every unit in `booking.ranges` and stores the booking, atomically.
    ///
    /// Each range is claimed with one conditional update that only touches
    /// unbooked units. If the number of claimed units falls short of
    /// [`NewBooking::requested_units`] nothing is persisted and the call fails
    /// with `AlreadyBooked`.
    async fn create_booking(&self, booking: &NewBooking) -> DomainResult<Booking>;

    /// The booking with `uuid`, if `caller_id` is its buyer or seller.
    /// Strangers get `None`, the same answer as for an unknown uuid.
    async fn get_booking(&self, uuid: Uuid, caller_id: i64) -> DomainResult<Option<Booking>>;

    async fn list_for_buyer(&self, buyer_id: i64, after: i64, limit: i64) -> DomainResult<Vec<Booking>>;

    /// Bookings on listings owned by `seller_id`, optionally narrowed to one listing.
    async fn list_for_seller(
        &self,
        seller_id: i64,
        listing_id: Option<i64>,
        after: i64,
        limit: i64,
    ) -> DomainResult<Vec<Booking>>;
}

#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    /// Fails with `DuplicatedPreference` if the pair already exists.
    async fn create_preference(&self, user_id: i64, spot_id: i64) -> DomainResult<()>;

    async fn preference_exists(&self, user_id: i64, spot_id: i64) -> DomainResult<bool>;

    /// Preferred spots with `spot id > after`, ascending by spot id. Spots
    /// the user can no longer see are left out.
    async fn list_preferred(&self, user_id: i64, after: i64, limit: i64) -> DomainResult<Vec<SpotEntry>>;

    /// Removing an absent preference is not an error.
    async fn delete_preference(&self, user_id: i64, spot_id: i64) -> DomainResult<()>;
}
