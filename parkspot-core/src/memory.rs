//! In-memory backend for every repository trait.
//!
//! All repositories created from one [`InMemoryStore`] share a single state
//! behind an async mutex. Each repository call holds the lock for its whole
//! duration, which gives the same all-or-nothing behaviour the Postgres
//! backend gets from transactions.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound::{Excluded, Included, Unbounded};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parkspot_shared::pii::Masked;
use parkspot_shared::{
    Booking, Car, CarEntry, Listing, ListingEntry, Location, ParkingSpot, SpotEntry, SpotFeatures, TimeSlot,
    TimeUnitKey,
};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::availability::AvailabilityService;
use crate::booking::BookingService;
use crate::cursor::Pagination;
use crate::identity::{Resolve, Resolved};
use crate::listing::ListingService;
use crate::preference::PreferenceService;
use crate::repository::{
    BookingRepository, CarRepository, ListingRepository, NewBooking, PreferenceRepository, SpotRepository,
    TimeUnitRepository,
};
use crate::spot::SpotService;
use crate::{DomainError, DomainResult};

#[derive(Default)]
struct State {
    last_id: i64,
    spots: BTreeMap<i64, SpotEntry>,
    listings: BTreeMap<i64, ListingEntry>,
    cars: BTreeMap<i64, CarEntry>,
    units: BTreeMap<(i64, TimeUnitKey), Option<i64>>,
    bookings: BTreeMap<i64, Booking>,
    preferences: BTreeSet<(i64, i64)>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn spot_is_public(&self, spot_id: i64) -> bool {
        self.listings
            .values()
            .any(|l| l.spot_id == spot_id && l.listing.active)
    }

    fn slots_where<F>(&self, listing_id: i64, keep: F) -> Vec<TimeSlot>
    where
        F: Fn(&Option<i64>) -> bool,
    {
        TimeSlot::group(
            self.units
                .iter()
                .filter(|((listing, _), booking)| *listing == listing_id && keep(booking))
                .map(|((_, key), _)| *key),
        )
    }

    fn booking_view(&self, booking: &Booking) -> Booking {
        let claimed = self
            .units
            .iter()
            .filter(|(_, b)| **b == Some(booking.id))
            .map(|((_, key), _)| *key);
        Booking {
            booked_times: TimeSlot::group(claimed),
            ..booking.clone()
        }
    }
}

type Shared = Arc<Mutex<State>>;

/// Owner of the shared in-memory state; hands out repositories and services
/// wired to it.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Shared,
}

pub struct MemorySpotRepository {
    state: Shared,
}

pub struct MemoryListingRepository {
    state: Shared,
}

pub struct MemoryCarRepository {
    state: Shared,
}

pub struct MemoryTimeUnitRepository {
    state: Shared,
}

pub struct MemoryBookingRepository {
    state: Shared,
}

pub struct MemoryPreferenceRepository {
    state: Shared,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spots(&self) -> Arc<MemorySpotRepository> {
        Arc::new(MemorySpotRepository { state: self.state.clone() })
    }

    pub fn listings(&self) -> Arc<MemoryListingRepository> {
        Arc::new(MemoryListingRepository { state: self.state.clone() })
    }

    pub fn cars(&self) -> Arc<MemoryCarRepository> {
        Arc::new(MemoryCarRepository { state: self.state.clone() })
    }

    pub fn time_units(&self) -> Arc<MemoryTimeUnitRepository> {
        Arc::new(MemoryTimeUnitRepository { state: self.state.clone() })
    }

    pub fn bookings(&self) -> Arc<MemoryBookingRepository> {
        Arc::new(MemoryBookingRepository { state: self.state.clone() })
    }

    pub fn preferences(&self) -> Arc<MemoryPreferenceRepository> {
        Arc::new(MemoryPreferenceRepository { state: self.state.clone() })
    }

    pub fn booking_service(&self, pagination: Pagination) -> BookingService {
        BookingService::new(self.bookings(), self.listings(), self.cars(), self.time_units(), pagination)
    }

    pub fn availability_service(&self) -> AvailabilityService {
        AvailabilityService::new(self.listings(), self.time_units())
    }

    pub fn spot_service(&self, pagination: Pagination) -> SpotService {
        SpotService::new(self.spots(), pagination)
    }

    pub fn listing_service(&self, pagination: Pagination) -> ListingService {
        ListingService::new(self.spots(), self.listings(), pagination)
    }

    pub fn preference_service(&self, pagination: Pagination) -> PreferenceService {
        PreferenceService::new(self.spots(), self.preferences(), pagination)
    }

    /// Creates a spot owned by `owner_id` and a listing on it.
    pub async fn seed_listing(&self, owner_id: i64, price_per_hour: Decimal, active: bool) -> ListingEntry {
        let mut state = self.state.lock().await;
        let spot_id = state.next_id();
        let spot = SpotEntry {
            id: spot_id,
            uuid: Uuid::new_v4(),
            owner_id,
            spot: sample_spot(price_per_hour),
        };
        let listing = ListingEntry {
            id: state.next_id(),
            uuid: Uuid::new_v4(),
            spot_id,
            spot_uuid: spot.uuid,
            owner_id,
            listing: Listing { price_per_hour, active },
        };
        state.spots.insert(spot.id, spot);
        state.listings.insert(listing.id, listing.clone());
        listing
    }

    pub async fn seed_units(&self, listing_id: i64, slots: &[TimeSlot]) {
        let mut state = self.state.lock().await;
        for key in slots.iter().flat_map(TimeSlot::keys) {
            state.units.entry((listing_id, key)).or_insert(None);
        }
    }

    pub async fn seed_car(&self, owner_id: i64) -> CarEntry {
        let mut state = self.state.lock().await;
        let car = CarEntry {
            id: state.next_id(),
            uuid: Uuid::new_v4(),
            owner_id,
            car: Car {
                licence_plate: Masked(format!("TEST-{}", state.last_id)),
                make: None,
                model: None,
            },
        };
        state.cars.insert(car.id, car.clone());
        car
    }

    /// Marks units as claimed by a booking that has no booking record.
    pub async fn mark_booked(&self, listing_id: i64, date: NaiveDate, units: &[u8]) {
        let mut state = self.state.lock().await;
        let booking_id = state.next_id();
        for unit in units {
            if let Some(key) = TimeUnitKey::new(date, *unit) {
                state.units.insert((listing_id, key), Some(booking_id));
            }
        }
    }

    pub async fn unbooked(&self, listing_id: i64) -> Vec<TimeSlot> {
        self.state.lock().await.slots_where(listing_id, Option::is_none)
    }
}

/// A plain spot description, used for seeding.
pub fn sample_spot(price_per_hour: Decimal) -> ParkingSpot {
    ParkingSpot {
        location: Location {
            street: "1 Harbour Road".to_string(),
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            country: "US".to_string(),
            latitude: None,
            longitude: None,
        },
        features: SpotFeatures::default(),
        price_per_hour,
    }
}

#[async_trait]
impl Resolve for MemorySpotRepository {
    async fn resolve(&self, uuid: Uuid) -> DomainResult<Option<Resolved>> {
        let state = self.state.lock().await;
        Ok(state.spots.values().find(|s| s.uuid == uuid).map(|s| Resolved {
            id: s.id,
            owner_id: s.owner_id,
            is_public: state.spot_is_public(s.id),
        }))
    }
}

#[async_trait]
impl SpotRepository for MemorySpotRepository {
    async fn create_spot(&self, owner_id: i64, spot: &ParkingSpot) -> DomainResult<SpotEntry> {
        let mut state = self.state.lock().await;
        let entry = SpotEntry {
            id: state.next_id(),
            uuid: Uuid::new_v4(),
            owner_id,
            spot: spot.clone(),
        };
        state.spots.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn get_spot(&self, id: i64) -> DomainResult<Option<SpotEntry>> {
        Ok(self.state.lock().await.spots.get(&id).cloned())
    }

    async fn list_spots(&self, owner_id: i64, after: i64, limit: i64) -> DomainResult<Vec<SpotEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .spots
            .range((Excluded(after), Unbounded))
            .map(|(_, s)| s)
            .filter(|s| s.owner_id == owner_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn delete_spot(&self, id: i64) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        if state.listings.values().any(|l| l.spot_id == id) {
            return Err(DomainError::InUse("spot still has listings".to_string()));
        }
        state.spots.remove(&id);
        state.preferences.retain(|(_, spot_id)| *spot_id != id);
        Ok(())
    }
}

#[async_trait]
impl Resolve for MemoryListingRepository {
    async fn resolve(&self, uuid: Uuid) -> DomainResult<Option<Resolved>> {
        let state = self.state.lock().await;
        Ok(state.listings.values().find(|l| l.uuid == uuid).map(|l| Resolved {
            id: l.id,
            owner_id: l.owner_id,
            is_public: l.is_public(),
        }))
    }
}

#[async_trait]
impl ListingRepository for MemoryListingRepository {
    async fn create_listing(&self, spot_id: i64, owner_id: i64, listing: &Listing) -> DomainResult<ListingEntry> {
        let mut state = self.state.lock().await;
        let spot_uuid = state
            .spots
            .get(&spot_id)
            .map(|s| s.uuid)
            .ok_or(DomainError::NotFound)?;
        let entry = ListingEntry {
            id: state.next_id(),
            uuid: Uuid::new_v4(),
            spot_id,
            spot_uuid,
            owner_id,
            listing: listing.clone(),
        };
        state.listings.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn get_listing(&self, id: i64) -> DomainResult<Option<ListingEntry>> {
        Ok(self.state.lock().await.listings.get(&id).cloned())
    }

    async fn list_listings(&self, owner_id: i64, after: i64, limit: i64) -> DomainResult<Vec<ListingEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .listings
            .range((Excluded(after), Unbounded))
            .map(|(_, l)| l)
            .filter(|l| l.owner_id == owner_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn set_active(&self, id: i64, active: bool) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        let listing = state.listings.get_mut(&id).ok_or(DomainError::NotFound)?;
        listing.listing.active = active;
        Ok(())
    }

    async fn delete_listing(&self, id: i64) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        if state.bookings.values().any(|b| b.listing_id == id) {
            return Err(DomainError::InUse("listing has bookings".to_string()));
        }
        state.listings.remove(&id);
        state.units.retain(|(listing_id, _), _| *listing_id != id);
        Ok(())
    }
}

#[async_trait]
impl Resolve for MemoryCarRepository {
    async fn resolve(&self, uuid: Uuid) -> DomainResult<Option<Resolved>> {
        let state = self.state.lock().await;
        Ok(state.cars.values().find(|c| c.uuid == uuid).map(|c| Resolved {
            id: c.id,
            owner_id: c.owner_id,
            is_public: false,
        }))
    }
}

#[async_trait]
impl CarRepository for MemoryCarRepository {
    async fn create_car(&self, owner_id: i64, car: &Car) -> DomainResult<CarEntry> {
        let mut state = self.state.lock().await;
        let entry = CarEntry {
            id: state.next_id(),
            uuid: Uuid::new_v4(),
            owner_id,
            car: car.clone(),
        };
        state.cars.insert(entry.id, entry.clone());
        Ok(entry)
    }
}

#[async_trait]
impl TimeUnitRepository for MemoryTimeUnitRepository {
    async fn create_units(&self, listing_id: i64, slots: &[TimeSlot]) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        let keys: Vec<TimeUnitKey> = slots.iter().flat_map(TimeSlot::keys).collect();
        if keys.iter().any(|key| state.units.contains_key(&(listing_id, *key))) {
            return Err(DomainError::DuplicatedTimeUnit);
        }
        for key in keys {
            state.units.insert((listing_id, key), None);
        }
        Ok(())
    }

    async fn units_by_listing(&self, listing_id: i64) -> DomainResult<Vec<TimeSlot>> {
        Ok(self.state.lock().await.slots_where(listing_id, |_| true))
    }

    async fn unbooked_units_by_listing(&self, listing_id: i64) -> DomainResult<Vec<TimeSlot>> {
        Ok(self.state.lock().await.slots_where(listing_id, Option::is_none))
    }

    async fn units_by_booking(&self, booking_id: i64) -> DomainResult<Vec<TimeSlot>> {
        let state = self.state.lock().await;
        Ok(TimeSlot::group(
            state
                .units
                .iter()
                .filter(|(_, b)| **b == Some(booking_id))
                .map(|((_, key), _)| *key),
        ))
    }

    async fn delete_units(&self, listing_id: i64, slots: &[TimeSlot]) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        let deletable: Vec<(i64, TimeUnitKey)> = slots
            .iter()
            .flat_map(TimeSlot::keys)
            .map(|key| (listing_id, key))
            .filter(|k| matches!(state.units.get(k), Some(None)))
            .collect();
        if deletable.is_empty() {
            return Err(DomainError::NotFound);
        }
        for k in deletable {
            state.units.remove(&k);
        }
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    async fn create_booking(&self, booking: &NewBooking) -> DomainResult<Booking> {
        let mut state = self.state.lock().await;
        let booking_id = state.next_id();

        let mut claimed = Vec::new();
        for range in &booking.ranges {
            for key in range.keys() {
                if let Some(slot) = state.units.get_mut(&(booking.listing_id, key)) {
                    if slot.is_none() {
                        *slot = Some(booking_id);
                        claimed.push(key);
                    }
                }
            }
        }

        if claimed.len() != booking.requested_units() {
            for key in claimed {
                state.units.insert((booking.listing_id, key), None);
            }
            return Err(DomainError::AlreadyBooked);
        }

        let stored = Booking {
            id: booking_id,
            uuid: booking.uuid,
            buyer_id: booking.buyer_id,
            seller_id: booking.seller_id,
            listing_id: booking.listing_id,
            listing_uuid: booking.listing_uuid,
            car_id: booking.car_id,
            paid_amount: booking.paid_amount,
            created_at: Utc::now(),
            booked_times: Vec::new(),
        };
        state.bookings.insert(booking_id, stored.clone());
        Ok(Booking {
            booked_times: TimeSlot::group(claimed),
            ..stored
        })
    }

    async fn get_booking(&self, uuid: Uuid, caller_id: i64) -> DomainResult<Option<Booking>> {
        let state = self.state.lock().await;
        Ok(state
            .bookings
            .values()
            .find(|b| b.uuid == uuid && b.is_party(caller_id))
            .map(|b| state.booking_view(b)))
    }

    async fn list_for_buyer(&self, buyer_id: i64, after: i64, limit: i64) -> DomainResult<Vec<Booking>> {
        let state = self.state.lock().await;
        Ok(state
            .bookings
            .range((Excluded(after), Unbounded))
            .map(|(_, b)| b)
            .filter(|b| b.buyer_id == buyer_id)
            .take(limit.max(0) as usize)
            .map(|b| state.booking_view(b))
            .collect())
    }

    async fn list_for_seller(
        &self,
        seller_id: i64,
        listing_id: Option<i64>,
        after: i64,
        limit: i64,
    ) -> DomainResult<Vec<Booking>> {
        let state = self.state.lock().await;
        Ok(state
            .bookings
            .range((Excluded(after), Unbounded))
            .map(|(_, b)| b)
            .filter(|b| b.seller_id == seller_id)
            .filter(|b| listing_id.map_or(true, |id| b.listing_id == id))
            .take(limit.max(0) as usize)
            .map(|b| state.booking_view(b))
            .collect())
    }
}

#[async_trait]
impl PreferenceRepository for MemoryPreferenceRepository {
    async fn create_preference(&self, user_id: i64, spot_id: i64) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        if !state.preferences.insert((user_id, spot_id)) {
            return Err(DomainError::DuplicatedPreference);
        }
        Ok(())
    }

    async fn preference_exists(&self, user_id: i64, spot_id: i64) -> DomainResult<bool> {
        Ok(self.state.lock().await.preferences.contains(&(user_id, spot_id)))
    }

    async fn list_preferred(&self, user_id: i64, after: i64, limit: i64) -> DomainResult<Vec<SpotEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .preferences
            .range((Excluded((user_id, after)), Included((user_id, i64::MAX))))
            .filter_map(|(_, spot_id)| state.spots.get(spot_id))
            .filter(|s| s.is_owned_by(user_id) || state.spot_is_public(s.id))
            .cloned()
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn delete_preference(&self, user_id: i64, spot_id: i64) -> DomainResult<()> {
        self.state.lock().await.preferences.remove(&(user_id, spot_id));
        Ok(())
    }
}
