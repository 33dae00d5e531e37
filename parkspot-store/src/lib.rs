pub mod app_config;
pub mod booking_repo;
pub mod car_repo;
pub mod database;
pub mod engine;
mod errors;
pub mod listing_repo;
pub mod preference_repo;
mod rows;
pub mod spot_repo;
pub mod telemetry;
pub mod time_unit_repo;

pub use app_config::Config;
pub use booking_repo::PgBookingRepository;
pub use car_repo::PgCarRepository;
pub use database::DbClient;
pub use engine::Engine;
pub use listing_repo::PgListingRepository;
pub use preference_repo::PgPreferenceRepository;
pub use spot_repo::PgSpotRepository;
pub use time_unit_repo::PgTimeUnitRepository;

/// Failures while bringing the engine up. Once running, every operation
/// reports a `parkspot_core::DomainError` instead.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}
