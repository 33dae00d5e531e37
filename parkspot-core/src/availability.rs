use std::collections::HashSet;
use std::sync::Arc;

use parkspot_shared::models::time_unit::UNITS_PER_DAY;
use parkspot_shared::TimeSlot;
use tracing::info;
use uuid::Uuid;

use crate::identity::{self, Access};
use crate::repository::{ListingRepository, TimeUnitRepository};
use crate::{DomainError, DomainResult};

/// Manages the bookable unit grid of a listing.
pub struct AvailabilityService {
    listings: Arc<dyn ListingRepository>,
    time_units: Arc<dyn TimeUnitRepository>,
}

impl AvailabilityService {
    pub fn new(listings: Arc<dyn ListingRepository>, time_units: Arc<dyn TimeUnitRepository>) -> Self {
        Self { listings, time_units }
    }

    /// Publishes units. All of them are created, or none when any already exists.
    pub async fn create(&self, caller_id: i64, listing_uuid: Uuid, slots: &[TimeSlot]) -> DomainResult<()> {
        validate_slots(slots)?;
        reject_repeats(slots)?;
        let listing = identity::resolve_for(&*self.listings, listing_uuid, caller_id, Access::Write).await?;
        self.time_units.create_units(listing.id, slots).await?;
        info!(
            "Published {} time units on listing {}",
            slots.iter().map(TimeSlot::unit_count).sum::<usize>(),
            listing_uuid
        );
        Ok(())
    }

    pub async fn get(&self, caller_id: i64, listing_uuid: Uuid) -> DomainResult<Vec<TimeSlot>> {
        let listing = identity::resolve_for(&*self.listings, listing_uuid, caller_id, Access::Read).await?;
        self.time_units.units_by_listing(listing.id).await
    }

    pub async fn get_unbooked(&self, caller_id: i64, listing_uuid: Uuid) -> DomainResult<Vec<TimeSlot>> {
        let listing = identity::resolve_for(&*self.listings, listing_uuid, caller_id, Access::Read).await?;
        self.time_units.unbooked_units_by_listing(listing.id).await
    }

    /// Withdraws unbooked units. Booked units are left alone; if nothing was
    /// withdrawable the call reports `NotFound`.
    pub async fn delete(&self, caller_id: i64, listing_uuid: Uuid, slots: &[TimeSlot]) -> DomainResult<()> {
        validate_slots(slots)?;
        let listing = identity::resolve_for(&*self.listings, listing_uuid, caller_id, Access::Write).await?;
        self.time_units.delete_units(listing.id, slots).await
    }
}

fn validate_slots(slots: &[TimeSlot]) -> DomainResult<()> {
    if slots.iter().all(|slot| slot.units.is_empty()) {
        return Err(DomainError::invalid("no time units given"));
    }
    for slot in slots {
        if let Some(unit) = slot.units.iter().find(|unit| **unit >= UNITS_PER_DAY) {
            return Err(DomainError::invalid(format!(
                "unit {} on {} is outside 0..{}",
                unit, slot.date, UNITS_PER_DAY
            )));
        }
    }
    Ok(())
}

/// A unit listed twice in one publish request would violate uniqueness anyway.
fn reject_repeats(slots: &[TimeSlot]) -> DomainResult<()> {
    let mut seen = HashSet::new();
    let repeated = slots.iter().flat_map(|slot| slot.keys()).any(|key| !seen.insert(key));
    if repeated {
        return Err(DomainError::DuplicatedTimeUnit);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::ErrorKind;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const OWNER: i64 = 10;
    const OTHER: i64 = 11;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_read_grouped() {
        let store = InMemoryStore::new();
        let listing = store.seed_listing(OWNER, dec!(3), true).await;
        let service = store.availability_service();

        service
            .create(OWNER, listing.uuid, &[TimeSlot::new(date(2), vec![7, 3]), TimeSlot::new(date(1), vec![0])])
            .await
            .unwrap();

        let slots = service.get(OTHER, listing.uuid).await.unwrap();
        assert_eq!(
            slots,
            vec![TimeSlot::new(date(1), vec![0]), TimeSlot::new(date(2), vec![3, 7])]
        );
    }

    #[tokio::test]
    async fn test_duplicate_create_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let listing = store.seed_listing(OWNER, dec!(3), true).await;
        let service = store.availability_service();

        service.create(OWNER, listing.uuid, &[TimeSlot::new(date(1), vec![4])]).await.unwrap();
        let err = service
            .create(OWNER, listing.uuid, &[TimeSlot::new(date(1), vec![3, 4, 5])])
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::DuplicatedTimeUnit);
        assert_eq!(err.kind(), ErrorKind::Duplicate);

        assert_eq!(
            service.get(OWNER, listing.uuid).await.unwrap(),
            vec![TimeSlot::new(date(1), vec![4])]
        );
    }

    #[tokio::test]
    async fn test_rejects_bad_slots() {
        let store = InMemoryStore::new();
        let listing = store.seed_listing(OWNER, dec!(3), true).await;
        let service = store.availability_service();

        let out_of_range = service.create(OWNER, listing.uuid, &[TimeSlot::new(date(1), vec![48])]).await;
        assert_eq!(out_of_range.unwrap_err().kind(), ErrorKind::InvalidInput);

        let empty = service.create(OWNER, listing.uuid, &[]).await;
        assert_eq!(empty.unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_write_access_rules() {
        let store = InMemoryStore::new();
        let public = store.seed_listing(OWNER, dec!(3), true).await;
        let hidden = store.seed_listing(OWNER, dec!(3), false).await;
        let service = store.availability_service();
        let slots = [TimeSlot::new(date(1), vec![1])];

        assert_eq!(service.create(OTHER, public.uuid, &slots).await.unwrap_err(), DomainError::Forbidden);
        assert_eq!(service.create(OTHER, hidden.uuid, &slots).await.unwrap_err(), DomainError::NotFound);
        assert_eq!(service.get(OTHER, hidden.uuid).await.unwrap_err(), DomainError::NotFound);
        assert!(service.get(OWNER, hidden.uuid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_skips_booked_units() {
        let store = InMemoryStore::new();
        let listing = store.seed_listing(OWNER, dec!(3), true).await;
        let service = store.availability_service();
        service
            .create(OWNER, listing.uuid, &[TimeSlot::new(date(1), vec![1, 2, 3])])
            .await
            .unwrap();
        store.mark_booked(listing.id, date(1), &[1, 2, 3]).await;

        let err = service
            .delete(OWNER, listing.uuid, &[TimeSlot::new(date(1), vec![1, 2, 3])])
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
        assert_eq!(
            service.get(OWNER, listing.uuid).await.unwrap(),
            vec![TimeSlot::new(date(1), vec![1, 2, 3])]
        );
        assert!(service.get_unbooked(OWNER, listing.uuid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_only_unbooked() {
        let store = InMemoryStore::new();
        let listing = store.seed_listing(OWNER, dec!(3), true).await;
        let service = store.availability_service();
        service
            .create(OWNER, listing.uuid, &[TimeSlot::new(date(1), vec![1, 2, 3])])
            .await
            .unwrap();
        store.mark_booked(listing.id, date(1), &[2]).await;

        service
            .delete(OWNER, listing.uuid, &[TimeSlot::new(date(1), vec![1, 2])])
            .await
            .unwrap();
        assert_eq!(
            service.get(OWNER, listing.uuid).await.unwrap(),
            vec![TimeSlot::new(date(1), vec![2, 3])]
        );
    }
}
