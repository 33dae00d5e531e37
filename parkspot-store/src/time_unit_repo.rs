use async_trait::async_trait;
use chrono::NaiveDate;
use parkspot_core::repository::TimeUnitRepository;
use parkspot_core::{DomainError, DomainResult};
use parkspot_shared::TimeSlot;
use sqlx::PgPool;

use crate::errors::{store_error, translate};
use crate::rows::{group_units, unit_arrays, UnitRow};

pub struct PgTimeUnitRepository {
    pool: PgPool,
}

impl PgTimeUnitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn units_where(&self, filter: &str, id: i64) -> DomainResult<Vec<TimeSlot>> {
        let sql = format!(
            "SELECT date, unit_num FROM time_unit WHERE {} ORDER BY date, unit_num",
            filter
        );
        let rows = sqlx::query_as::<_, UnitRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        group_units(rows)
    }
}

#[async_trait]
impl TimeUnitRepository for PgTimeUnitRepository {
    async fn create_units(&self, listing_id: i64, slots: &[TimeSlot]) -> DomainResult<()> {
        let (dates, units): (Vec<NaiveDate>, Vec<i16>) = unit_arrays(slots);

        // A single statement, so a duplicate anywhere leaves nothing behind.
        sqlx::query(
            r#"
            INSERT INTO time_unit (listing_id, date, unit_num)
            SELECT $1, d, u FROM UNNEST($2::date[], $3::smallint[]) AS t(d, u)
            "#,
        )
        .bind(listing_id)
        .bind(&dates)
        .bind(&units)
        .execute(&self.pool)
        .await
        .map_err(|e| translate(e, DomainError::DuplicatedTimeUnit))?;

        tracing::info!("Published {} time units for listing {}", dates.len(), listing_id);
        Ok(())
    }

    async fn units_by_listing(&self, listing_id: i64) -> DomainResult<Vec<TimeSlot>> {
        self.units_where("listing_id = $1", listing_id).await
    }

    async fn unbooked_units_by_listing(&self, listing_id: i64) -> DomainResult<Vec<TimeSlot>> {
        self.units_where("listing_id = $1 AND booking_id IS NULL", listing_id).await
    }

    async fn units_by_booking(&self, booking_id: i64) -> DomainResult<Vec<TimeSlot>> {
        self.units_where("booking_id = $1", booking_id).await
    }

    async fn delete_units(&self, listing_id: i64, slots: &[TimeSlot]) -> DomainResult<()> {
        let (dates, units) = unit_arrays(slots);

        let result = sqlx::query(
            r#"
            DELETE FROM time_unit
            WHERE listing_id = $1
              AND booking_id IS NULL
              AND (date, unit_num) IN (SELECT * FROM UNNEST($2::date[], $3::smallint[]))
            "#,
        )
        .bind(listing_id)
        .bind(&dates)
        .bind(&units)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        tracing::info!("Withdrew {} time units from listing {}", result.rows_affected(), listing_id);
        Ok(())
    }
}
