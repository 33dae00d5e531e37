use std::sync::Arc;

use parkspot_core::repository::{
    BookingRepository, CarRepository, ListingRepository, PreferenceRepository, SpotRepository,
    TimeUnitRepository,
};
use parkspot_core::{
    AvailabilityService, BookingService, ListingService, Pagination, PreferenceService, SpotService,
};
use sqlx::PgPool;
use tracing::info;

use crate::app_config::Config;
use crate::database::DbClient;
use crate::telemetry;
use crate::{
    PgBookingRepository, PgCarRepository, PgListingRepository, PgPreferenceRepository,
    PgSpotRepository, PgTimeUnitRepository, StoreError,
};

/// Every service of the engine, wired onto one Postgres pool.
///
/// The route layer holds one `Engine` and calls the services with the
/// already authenticated internal user id.
pub struct Engine {
    pub spots: SpotService,
    pub listings: ListingService,
    pub availability: AvailabilityService,
    pub bookings: BookingService,
    pub preferences: PreferenceService,
    /// Cars have no service of their own; callers register them directly.
    pub cars: Arc<dyn CarRepository>,
}

impl Engine {
    pub fn new(pool: PgPool, pagination: Pagination) -> Self {
        let spots: Arc<dyn SpotRepository> = Arc::new(PgSpotRepository::new(pool.clone()));
        let listings: Arc<dyn ListingRepository> = Arc::new(PgListingRepository::new(pool.clone()));
        let cars: Arc<dyn CarRepository> = Arc::new(PgCarRepository::new(pool.clone()));
        let time_units: Arc<dyn TimeUnitRepository> = Arc::new(PgTimeUnitRepository::new(pool.clone()));
        let bookings: Arc<dyn BookingRepository> = Arc::new(PgBookingRepository::new(pool.clone()));
        let preferences: Arc<dyn PreferenceRepository> = Arc::new(PgPreferenceRepository::new(pool));

        Self {
            spots: SpotService::new(spots.clone(), pagination),
            listings: ListingService::new(spots.clone(), listings.clone(), pagination),
            availability: AvailabilityService::new(listings.clone(), time_units.clone()),
            bookings: BookingService::new(bookings, listings, cars.clone(), time_units, pagination),
            preferences: PreferenceService::new(spots, preferences, pagination),
            cars,
        }
    }

    /// Connects, migrates and wires the engine from loaded configuration.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        info!("Connecting to database...");
        let db = DbClient::new(&config.database).await?;
        db.migrate().await?;

        Ok(Self::new(db.pool, Pagination::from(&config.pagination)))
    }

    /// Process entry point: layered configuration, logging, then [`Engine::connect`].
    pub async fn from_environment() -> Result<Self, StoreError> {
        let config = Config::load()?;
        telemetry::init(&config.logging)?;
        info!("Starting parkspot engine (max page size {})", config.pagination.max_page_size);
        Self::connect(&config).await
    }
}
