pub mod models;
pub mod pii;

pub use models::{
    Booking, Car, CarEntry, Listing, ListingEntry, Location, ParkingSpot, SpotEntry, SpotFeatures,
    TimeRange, TimeSlot, TimeUnitKey, UnitRange,
};
