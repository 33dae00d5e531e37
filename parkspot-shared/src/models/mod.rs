pub mod booking;
pub mod car;
pub mod listing;
pub mod spot;
pub mod time_unit;

pub use booking::Booking;
pub use car::{Car, CarEntry};
pub use listing::{Listing, ListingEntry};
pub use spot::{Location, ParkingSpot, SpotEntry, SpotFeatures};
pub use time_unit::{TimeRange, TimeSlot, TimeUnitKey, UnitRange};
