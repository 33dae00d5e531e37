use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkspot_core::repository::{BookingRepository, NewBooking};
use parkspot_core::{DomainError, DomainResult};
use parkspot_shared::{Booking, TimeSlot, TimeUnitKey};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{claim_error, store_error};
use crate::rows::{BookedUnitRow, BookingRow, UnitRow, BOOKING_COLUMNS};

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the booked units of every row in one round trip.
    async fn attach_units(&self, rows: Vec<BookingRow>) -> DomainResult<Vec<Booking>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();

        let units = sqlx::query_as::<_, BookedUnitRow>(
            "SELECT booking_id, date, unit_num FROM time_unit WHERE booking_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        let mut by_booking: HashMap<i64, Vec<TimeUnitKey>> = HashMap::new();
        for unit in units {
            let key = UnitRow { date: unit.date, unit_num: unit.unit_num }.key()?;
            by_booking.entry(unit.booking_id).or_default().push(key);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let keys = by_booking.remove(&row.id).unwrap_or_default();
                row.into_booking(TimeSlot::group(keys))
            })
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct InsertedBooking {
    id: i64,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create_booking(&self, booking: &NewBooking) -> DomainResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let inserted = sqlx::query_as::<_, InsertedBooking>(
            r#"
            INSERT INTO booking (uuid, buyer_id, listing_id, car_id, paid_amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at
            "#,
        )
        .bind(booking.uuid)
        .bind(booking.buyer_id)
        .bind(booking.listing_id)
        .bind(booking.car_id)
        .bind(booking.paid_amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?;

        // Ranges are claimed in ascending order so that competing claims
        // lock rows in the same order.
        let mut ranges = booking.ranges.clone();
        ranges.sort();

        let mut claimed: u64 = 0;
        for range in &ranges {
            let result = sqlx::query(
                r#"
                UPDATE time_unit SET booking_id = $1
                WHERE listing_id = $2
                  AND booking_id IS NULL
                  AND (date, unit_num) >= ($3::date, $4::smallint)
                  AND (date, unit_num) < ($5::date, $6::smallint)
                "#,
            )
            .bind(inserted.id)
            .bind(booking.listing_id)
            .bind(range.start.date)
            .bind(i16::from(range.start.unit))
            .bind(range.end.date)
            .bind(i16::from(range.end.unit))
            .execute(&mut *tx)
            .await
            .map_err(claim_error)?;

            claimed += result.rows_affected();
        }

        let requested = booking.requested_units() as u64;
        if claimed != requested {
            tx.rollback().await.map_err(store_error)?;
            warn!(
                "Booking {} on listing {} claimed {} of {} units, rolled back",
                booking.uuid, booking.listing_id, claimed, requested
            );
            return Err(DomainError::AlreadyBooked);
        }

        tx.commit().await.map_err(claim_error)?;
        info!("Booking {} committed with {} units", booking.uuid, claimed);

        Ok(Booking {
            id: inserted.id,
            uuid: booking.uuid,
            buyer_id: booking.buyer_id,
            seller_id: booking.seller_id,
            listing_id: booking.listing_id,
            listing_uuid: booking.listing_uuid,
            car_id: booking.car_id,
            paid_amount: booking.paid_amount,
            created_at: inserted.created_at,
            booked_times: TimeSlot::group(ranges.iter().flat_map(|range| range.keys())),
        })
    }

    /// Party check happens in the query, so a stranger's lookup costs the
    /// same single round trip as a miss.
    async fn get_booking(&self, uuid: Uuid, caller_id: i64) -> DomainResult<Option<Booking>> {
        let sql = format!(
            r#"
            SELECT {} FROM booking b JOIN listing l ON l.id = b.listing_id
            WHERE b.uuid = $1 AND (b.buyer_id = $2 OR l.owner_id = $2)
            "#,
            BOOKING_COLUMNS
        );
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(uuid)
            .bind(caller_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        match row {
            Some(row) => Ok(self.attach_units(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_for_buyer(&self, buyer_id: i64, after: i64, limit: i64) -> DomainResult<Vec<Booking>> {
        let sql = format!(
            r#"
            SELECT {} FROM booking b JOIN listing l ON l.id = b.listing_id
            WHERE b.buyer_id = $1 AND b.id > $2
            ORDER BY b.id
            LIMIT $3
            "#,
            BOOKING_COLUMNS
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(buyer_id)
            .bind(after)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        self.attach_units(rows).await
    }

    async fn list_for_seller(
        &self,
        seller_id: i64,
        listing_id: Option<i64>,
        after: i64,
        limit: i64,
    ) -> DomainResult<Vec<Booking>> {
        let sql = format!(
            r#"
            SELECT {} FROM booking b JOIN listing l ON l.id = b.listing_id
            WHERE l.owner_id = $1
              AND ($2::bigint IS NULL OR b.listing_id = $2)
              AND b.id > $3
            ORDER BY b.id
            LIMIT $4
            "#,
            BOOKING_COLUMNS
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(seller_id)
            .bind(listing_id)
            .bind(after)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        self.attach_units(rows).await
    }
}
