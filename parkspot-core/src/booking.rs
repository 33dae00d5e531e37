use std::sync::Arc;

use parkspot_shared::{Booking, TimeRange, TimeSlot};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cursor::{Page, Pagination};
use crate::identity::{self, Access};
use crate::pricing::BookingPlan;
use crate::repository::{BookingRepository, CarRepository, ListingRepository, NewBooking, TimeUnitRepository};
use crate::{DomainError, DomainResult};

/// Optional narrowing for [`BookingService::get_many_for_seller`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SellerFilter {
    pub listing_uuid: Option<Uuid>,
}

/// Claims time units for buyers and exposes bookings to their parties.
///
/// No in-process locking happens here: the repository performs the claim as a
/// single transaction, so any number of service instances may share a store.
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    listings: Arc<dyn ListingRepository>,
    cars: Arc<dyn CarRepository>,
    time_units: Arc<dyn TimeUnitRepository>,
    pagination: Pagination,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        listings: Arc<dyn ListingRepository>,
        cars: Arc<dyn CarRepository>,
        time_units: Arc<dyn TimeUnitRepository>,
        pagination: Pagination,
    ) -> Self {
        Self { bookings, listings, cars, time_units, pagination }
    }

    /// Books `requested` on a listing for `buyer_id`.
    ///
    /// The paid amount is derived from the listing price and the number of
    /// units. Either every requested unit is claimed or the call fails with
    /// `AlreadyBooked` and nothing changes.
    pub async fn create(
        &self,
        buyer_id: i64,
        listing_uuid: Uuid,
        car_uuid: Uuid,
        requested: &[TimeRange],
    ) -> DomainResult<Booking> {
        if requested.is_empty() {
            return Err(DomainError::EmptyBookingTimes);
        }

        let listing_ref = identity::resolve_for(&*self.listings, listing_uuid, buyer_id, Access::Read).await?;
        if listing_ref.owner_id == buyer_id {
            return Err(DomainError::Forbidden);
        }
        let listing = self
            .listings
            .get_listing(listing_ref.id)
            .await?
            .ok_or(DomainError::NotFound)?;

        // Cars are never public, so a foreign car reads as missing.
        let car = identity::resolve_for(&*self.cars, car_uuid, buyer_id, Access::Write).await?;

        let plan = BookingPlan::new(requested, listing.price_per_hour())?;

        let new_booking = NewBooking {
            uuid: Uuid::new_v4(),
            buyer_id,
            seller_id: listing.owner_id,
            listing_id: listing.id,
            listing_uuid: listing.uuid,
            car_id: car.id,
            paid_amount: plan.paid_amount,
            ranges: plan.ranges,
        };

        match self.bookings.create_booking(&new_booking).await {
            Ok(booking) => {
                info!(
                    "Booking {} created on listing {}: {} units, paid {}",
                    booking.uuid,
                    listing.uuid,
                    plan.unit_count,
                    booking.paid_amount
                );
                Ok(booking)
            }
            Err(DomainError::AlreadyBooked) => {
                warn!("Booking on listing {} lost a claim: requested time already booked", listing.uuid);
                Err(DomainError::AlreadyBooked)
            }
            Err(e) => Err(e),
        }
    }

    /// Visible to the buyer and to the owner of the booked listing only.
    pub async fn get_by_uuid(&self, caller_id: i64, booking_uuid: Uuid) -> DomainResult<Booking> {
        let booking = self.bookings.get_booking(booking_uuid, caller_id).await?;
        let booking = booking.ok_or(DomainError::NotFound)?;
        identity::authorize_party(&[booking.buyer_id, booking.seller_id], caller_id)?;
        Ok(booking)
    }

    pub async fn get_booked_times_by_uuid(&self, caller_id: i64, booking_uuid: Uuid) -> DomainResult<Vec<TimeSlot>> {
        let booking = self.get_by_uuid(caller_id, booking_uuid).await?;
        self.time_units.units_by_booking(booking.id).await
    }

    pub async fn get_many_for_buyer(&self, caller_id: i64, count: u32, after: Option<&str>) -> DomainResult<Page<Booking>> {
        let request = self.pagination.request(count, after)?;
        let rows = self
            .bookings
            .list_for_buyer(caller_id, request.after.anchor, request.limit())
            .await?;
        Ok(Page::from_rows(rows, request.count, |b| b.id))
    }

    /// Bookings on the caller's listings. A listing filter must name a
    /// listing the caller owns.
    pub async fn get_many_for_seller(
        &self,
        caller_id: i64,
        count: u32,
        after: Option<&str>,
        filter: SellerFilter,
    ) -> DomainResult<Page<Booking>> {
        let request = self.pagination.request(count, after)?;
        let listing_id = match filter.listing_uuid {
            Some(uuid) => Some(identity::resolve_for(&*self.listings, uuid, caller_id, Access::Write).await?.id),
            None => None,
        };
        let rows = self
            .bookings
            .list_for_seller(caller_id, listing_id, request.after.anchor, request.limit())
            .await?;
        Ok(Page::from_rows(rows, request.count, |b| b.id))
    }
}
