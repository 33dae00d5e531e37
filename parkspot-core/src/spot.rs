use std::sync::Arc;

use parkspot_shared::{ParkingSpot, SpotEntry};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::cursor::{Page, Pagination};
use crate::identity::{self, Access};
use crate::repository::SpotRepository;
use crate::{DomainError, DomainResult};

pub struct SpotService {
    spots: Arc<dyn SpotRepository>,
    pagination: Pagination,
}

impl SpotService {
    pub fn new(spots: Arc<dyn SpotRepository>, pagination: Pagination) -> Self {
        Self { spots, pagination }
    }

    pub async fn create(&self, owner_id: i64, spot: &ParkingSpot) -> DomainResult<SpotEntry> {
        if spot.price_per_hour <= Decimal::ZERO {
            return Err(DomainError::invalid("price per hour must be positive"));
        }
        let entry = self.spots.create_spot(owner_id, spot).await?;
        info!("Spot {} created", entry.uuid);
        Ok(entry)
    }

    pub async fn get(&self, caller_id: i64, spot_uuid: Uuid) -> DomainResult<SpotEntry> {
        let spot = identity::resolve_for(&*self.spots, spot_uuid, caller_id, Access::Read).await?;
        self.spots.get_spot(spot.id).await?.ok_or(DomainError::NotFound)
    }

    pub async fn get_many(&self, caller_id: i64, count: u32, after: Option<&str>) -> DomainResult<Page<SpotEntry>> {
        let request = self.pagination.request(count, after)?;
        let rows = self
            .spots
            .list_spots(caller_id, request.after.anchor, request.limit())
            .await?;
        Ok(Page::from_rows(rows, request.count, |s| s.id))
    }

    /// Fails with `InUse` while listings still reference the spot.
    pub async fn delete(&self, caller_id: i64, spot_uuid: Uuid) -> DomainResult<()> {
        let spot = identity::resolve_for(&*self.spots, spot_uuid, caller_id, Access::Write).await?;
        self.spots.delete_spot(spot.id).await?;
        info!("Spot {} deleted", spot_uuid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{sample_spot, InMemoryStore};
    use crate::ErrorKind;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_spot_lifecycle() {
        let store = InMemoryStore::new();
        let service = store.spot_service(Pagination::default());

        let entry = service.create(1, &sample_spot(dec!(2.50))).await.unwrap();
        assert_eq!(service.get(1, entry.uuid).await.unwrap(), entry);

        // Without an active listing the spot is private.
        assert_eq!(service.get(2, entry.uuid).await.unwrap_err(), DomainError::NotFound);
        assert_eq!(service.delete(2, entry.uuid).await.unwrap_err(), DomainError::NotFound);

        service.delete(1, entry.uuid).await.unwrap();
        assert_eq!(service.get(1, entry.uuid).await.unwrap_err(), DomainError::NotFound);
    }

    #[tokio::test]
    async fn test_spot_with_active_listing_is_public_but_read_only() {
        let store = InMemoryStore::new();
        let listing = store.seed_listing(1, dec!(4), true).await;
        let service = store.spot_service(Pagination::default());

        assert_eq!(service.get(2, listing.spot_uuid).await.unwrap().uuid, listing.spot_uuid);
        assert_eq!(service.delete(2, listing.spot_uuid).await.unwrap_err(), DomainError::Forbidden);
        assert_eq!(service.delete(1, listing.spot_uuid).await.unwrap_err().kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_rejects_free_spots() {
        let store = InMemoryStore::new();
        let service = store.spot_service(Pagination::default());
        let err = service.create(1, &sample_spot(Decimal::ZERO)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_list_only_own_spots() {
        let store = InMemoryStore::new();
        let service = store.spot_service(Pagination { max_page_size: 2 });
        for _ in 0..3 {
            service.create(1, &sample_spot(dec!(1))).await.unwrap();
        }
        service.create(2, &sample_spot(dec!(1))).await.unwrap();

        let first = service.get_many(1, 50, None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        let rest = service.get_many(1, 50, first.next_cursor.as_deref()).await.unwrap();
        assert_eq!(rest.items.len(), 1);
        assert!(rest.next_cursor.is_none());
        assert!(first.items.iter().chain(&rest.items).all(|s| s.owner_id == 1));
    }
}
