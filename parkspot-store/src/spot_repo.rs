use async_trait::async_trait;
use parkspot_core::repository::SpotRepository;
use parkspot_core::{DomainResult, Resolve, Resolved};
use parkspot_shared::{ParkingSpot, SpotEntry};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::store_error;
use crate::rows::{ResolvedRow, SpotRow, SPOT_COLUMNS};

pub struct PgSpotRepository {
    pool: PgPool,
}

impl PgSpotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Resolve for PgSpotRepository {
    async fn resolve(&self, uuid: Uuid) -> DomainResult<Option<Resolved>> {
        let row = sqlx::query_as::<_, ResolvedRow>(
            r#"
            SELECT s.id, s.owner_id,
                   EXISTS (SELECT 1 FROM listing l WHERE l.spot_id = s.id AND l.active) AS is_public
            FROM spot s
            WHERE s.uuid = $1
            "#,
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(Resolved::from))
    }
}

#[async_trait]
impl SpotRepository for PgSpotRepository {
    async fn create_spot(&self, owner_id: i64, spot: &ParkingSpot) -> DomainResult<SpotEntry> {
        let sql = format!(
            r#"
            INSERT INTO spot AS s (uuid, owner_id, street, city, postal_code, country,
                                   latitude, longitude, covered, ev_charging, max_height_cm, price_per_hour)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            SPOT_COLUMNS
        );

        let row = sqlx::query_as::<_, SpotRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(&spot.location.street)
            .bind(&spot.location.city)
            .bind(&spot.location.postal_code)
            .bind(&spot.location.country)
            .bind(spot.location.latitude)
            .bind(spot.location.longitude)
            .bind(spot.features.covered)
            .bind(spot.features.ev_charging)
            .bind(spot.features.max_height_cm)
            .bind(spot.price_per_hour)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(row.into())
    }

    async fn get_spot(&self, id: i64) -> DomainResult<Option<SpotEntry>> {
        let sql = format!("SELECT {} FROM spot s WHERE s.id = $1", SPOT_COLUMNS);
        let row = sqlx::query_as::<_, SpotRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(row.map(SpotEntry::from))
    }

    async fn list_spots(&self, owner_id: i64, after: i64, limit: i64) -> DomainResult<Vec<SpotEntry>> {
        let sql = format!(
            "SELECT {} FROM spot s WHERE s.owner_id = $1 AND s.id > $2 ORDER BY s.id LIMIT $3",
            SPOT_COLUMNS
        );
        let rows = sqlx::query_as::<_, SpotRow>(&sql)
            .bind(owner_id)
            .bind(after)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(rows.into_iter().map(SpotEntry::from).collect())
    }

    /// Preferences follow the spot; listings keep it alive (`InUse`).
    async fn delete_spot(&self, id: i64) -> DomainResult<()> {
        sqlx::query("DELETE FROM spot WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(())
    }
}
