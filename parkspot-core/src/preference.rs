use std::sync::Arc;

use parkspot_shared::SpotEntry;
use uuid::Uuid;

use crate::cursor::{Page, Pagination};
use crate::identity::{self, Access};
use crate::repository::{PreferenceRepository, SpotRepository};
use crate::DomainResult;

/// A user's preferred ("favourite") spots.
pub struct PreferenceService {
    spots: Arc<dyn SpotRepository>,
    preferences: Arc<dyn PreferenceRepository>,
    pagination: Pagination,
}

impl PreferenceService {
    pub fn new(spots: Arc<dyn SpotRepository>, preferences: Arc<dyn PreferenceRepository>, pagination: Pagination) -> Self {
        Self { spots, preferences, pagination }
    }

    pub async fn create(&self, caller_id: i64, spot_uuid: Uuid) -> DomainResult<()> {
        let spot = identity::resolve_for(&*self.spots, spot_uuid, caller_id, Access::Read).await?;
        self.preferences.create_preference(caller_id, spot.id).await
    }

    pub async fn exists(&self, caller_id: i64, spot_uuid: Uuid) -> DomainResult<bool> {
        let spot = identity::resolve_for(&*self.spots, spot_uuid, caller_id, Access::Read).await?;
        self.preferences.preference_exists(caller_id, spot.id).await
    }

    pub async fn get_many(&self, caller_id: i64, count: u32, after: Option<&str>) -> DomainResult<Page<SpotEntry>> {
        let request = self.pagination.request(count, after)?;
        let rows = self
            .preferences
            .list_preferred(caller_id, request.after.anchor, request.limit())
            .await?;
        Ok(Page::from_rows(rows, request.count, |s| s.id))
    }

    /// A no-op when the preference, or the spot itself, does not exist. The
    /// spot is not visibility-checked so that a spot gone private can still be
    /// removed from preferences.
    pub async fn delete(&self, caller_id: i64, spot_uuid: Uuid) -> DomainResult<()> {
        match self.spots.resolve(spot_uuid).await? {
            Some(spot) => self.preferences.delete_preference(caller_id, spot.id).await,
            None => Ok(()),
        }
    }
}
