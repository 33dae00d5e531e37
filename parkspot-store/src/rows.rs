use chrono::{DateTime, NaiveDate, Utc};
use parkspot_core::{DomainError, DomainResult, Resolved};
use parkspot_shared::{
    Booking, Listing, ListingEntry, Location, ParkingSpot, SpotEntry, SpotFeatures, TimeSlot,
    TimeUnitKey,
};
use rust_decimal::Decimal;
use uuid::Uuid;

pub(crate) const SPOT_COLUMNS: &str = "s.id, s.uuid, s.owner_id, s.street, s.city, s.postal_code, \
     s.country, s.latitude, s.longitude, s.covered, s.ev_charging, s.max_height_cm, s.price_per_hour";

pub(crate) const LISTING_COLUMNS: &str =
    "l.id, l.uuid, l.spot_id, s.uuid AS spot_uuid, l.owner_id, l.price_per_hour, l.active";

pub(crate) const BOOKING_COLUMNS: &str = "b.id, b.uuid, b.buyer_id, l.owner_id AS seller_id, \
     b.listing_id, l.uuid AS listing_uuid, b.car_id, b.paid_amount, b.created_at";

#[derive(sqlx::FromRow)]
pub(crate) struct ResolvedRow {
    id: i64,
    owner_id: i64,
    is_public: bool,
}

impl From<ResolvedRow> for Resolved {
    fn from(row: ResolvedRow) -> Self {
        Resolved { id: row.id, owner_id: row.owner_id, is_public: row.is_public }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SpotRow {
    id: i64,
    uuid: Uuid,
    owner_id: i64,
    street: String,
    city: String,
    postal_code: String,
    country: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    covered: bool,
    ev_charging: bool,
    max_height_cm: Option<i32>,
    price_per_hour: Decimal,
}

impl From<SpotRow> for SpotEntry {
    fn from(row: SpotRow) -> Self {
        SpotEntry {
            id: row.id,
            uuid: row.uuid,
            owner_id: row.owner_id,
            spot: ParkingSpot {
                location: Location {
                    street: row.street,
                    city: row.city,
                    postal_code: row.postal_code,
                    country: row.country,
                    latitude: row.latitude,
                    longitude: row.longitude,
                },
                features: SpotFeatures {
                    covered: row.covered,
                    ev_charging: row.ev_charging,
                    max_height_cm: row.max_height_cm,
                },
                price_per_hour: row.price_per_hour,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ListingRow {
    id: i64,
    uuid: Uuid,
    spot_id: i64,
    spot_uuid: Uuid,
    owner_id: i64,
    price_per_hour: Decimal,
    active: bool,
}

impl From<ListingRow> for ListingEntry {
    fn from(row: ListingRow) -> Self {
        ListingEntry {
            id: row.id,
            uuid: row.uuid,
            spot_id: row.spot_id,
            spot_uuid: row.spot_uuid,
            owner_id: row.owner_id,
            listing: Listing { price_per_hour: row.price_per_hour, active: row.active },
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookingRow {
    pub id: i64,
    uuid: Uuid,
    buyer_id: i64,
    seller_id: i64,
    listing_id: i64,
    listing_uuid: Uuid,
    car_id: i64,
    paid_amount: Decimal,
    created_at: DateTime<Utc>,
}

impl BookingRow {
    pub fn into_booking(self, booked_times: Vec<TimeSlot>) -> Booking {
        Booking {
            id: self.id,
            uuid: self.uuid,
            buyer_id: self.buyer_id,
            seller_id: self.seller_id,
            listing_id: self.listing_id,
            listing_uuid: self.listing_uuid,
            car_id: self.car_id,
            paid_amount: self.paid_amount,
            created_at: self.created_at,
            booked_times,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UnitRow {
    pub date: NaiveDate,
    pub unit_num: i16,
}

impl UnitRow {
    pub fn key(&self) -> DomainResult<TimeUnitKey> {
        u8::try_from(self.unit_num)
            .ok()
            .and_then(|unit| TimeUnitKey::new(self.date, unit))
            .ok_or_else(|| DomainError::Internal(format!("corrupt time unit {} on {}", self.unit_num, self.date)))
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookedUnitRow {
    pub booking_id: i64,
    pub date: NaiveDate,
    pub unit_num: i16,
}

/// Groups stored unit rows into slots, one per date.
pub(crate) fn group_units(rows: Vec<UnitRow>) -> DomainResult<Vec<TimeSlot>> {
    let keys = rows.iter().map(UnitRow::key).collect::<DomainResult<Vec<_>>>()?;
    Ok(TimeSlot::group(keys))
}

/// Flattens slots into the parallel arrays `UNNEST` expects.
pub(crate) fn unit_arrays(slots: &[TimeSlot]) -> (Vec<NaiveDate>, Vec<i16>) {
    slots
        .iter()
        .flat_map(|slot| slot.units.iter().map(move |unit| (slot.date, i16::from(*unit))))
        .unzip()
}
