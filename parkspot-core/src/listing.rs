use std::sync::Arc;

use parkspot_shared::{Listing, ListingEntry};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::cursor::{Page, Pagination};
use crate::identity::{self, Access};
use crate::repository::{ListingRepository, SpotRepository};
use crate::{DomainError, DomainResult};

/// Listings ("leasings") offer an owned spot for rent.
pub struct ListingService {
    spots: Arc<dyn SpotRepository>,
    listings: Arc<dyn ListingRepository>,
    pagination: Pagination,
}

impl ListingService {
    pub fn new(spots: Arc<dyn SpotRepository>, listings: Arc<dyn ListingRepository>, pagination: Pagination) -> Self {
        Self { spots, listings, pagination }
    }

    pub async fn create(&self, caller_id: i64, spot_uuid: Uuid, listing: &Listing) -> DomainResult<ListingEntry> {
        if listing.price_per_hour <= Decimal::ZERO {
            return Err(DomainError::invalid("price per hour must be positive"));
        }
        let spot = identity::resolve_for(&*self.spots, spot_uuid, caller_id, Access::Write).await?;
        let entry = self.listings.create_listing(spot.id, spot.owner_id, listing).await?;
        info!("Listing {} created for spot {}", entry.uuid, spot_uuid);
        Ok(entry)
    }

    pub async fn get(&self, caller_id: i64, listing_uuid: Uuid) -> DomainResult<ListingEntry> {
        let listing = identity::resolve_for(&*self.listings, listing_uuid, caller_id, Access::Read).await?;
        self.listings.get_listing(listing.id).await?.ok_or(DomainError::NotFound)
    }

    pub async fn get_many(&self, caller_id: i64, count: u32, after: Option<&str>) -> DomainResult<Page<ListingEntry>> {
        let request = self.pagination.request(count, after)?;
        let rows = self
            .listings
            .list_listings(caller_id, request.after.anchor, request.limit())
            .await?;
        Ok(Page::from_rows(rows, request.count, |l| l.id))
    }

    pub async fn set_active(&self, caller_id: i64, listing_uuid: Uuid, active: bool) -> DomainResult<()> {
        let listing = identity::resolve_for(&*self.listings, listing_uuid, caller_id, Access::Write).await?;
        self.listings.set_active(listing.id, active).await
    }

    /// Fails with `InUse` once the listing has bookings.
    pub async fn delete(&self, caller_id: i64, listing_uuid: Uuid) -> DomainResult<()> {
        let listing = identity::resolve_for(&*self.listings, listing_uuid, caller_id, Access::Write).await?;
        self.listings.delete_listing(listing.id).await?;
        info!("Listing {} deleted", listing_uuid);
        Ok(())
    }
}
