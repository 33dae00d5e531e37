use async_trait::async_trait;
use parkspot_core::repository::ListingRepository;
use parkspot_core::{DomainError, DomainResult, Resolve, Resolved};
use parkspot_shared::{Listing, ListingEntry};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::store_error;
use crate::rows::{ListingRow, ResolvedRow, LISTING_COLUMNS};

pub struct PgListingRepository {
    pool: PgPool,
}

impl PgListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Resolve for PgListingRepository {
    async fn resolve(&self, uuid: Uuid) -> DomainResult<Option<Resolved>> {
        let row = sqlx::query_as::<_, ResolvedRow>(
            "SELECT id, owner_id, active AS is_public FROM listing WHERE uuid = $1",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(Resolved::from))
    }
}

#[async_trait]
impl ListingRepository for PgListingRepository {
    async fn create_listing(&self, spot_id: i64, owner_id: i64, listing: &Listing) -> DomainResult<ListingEntry> {
        let sql = format!(
            r#"
            WITH l AS (
                INSERT INTO listing (uuid, spot_id, owner_id, price_per_hour, active)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT {} FROM l JOIN spot s ON s.id = l.spot_id
            "#,
            LISTING_COLUMNS
        );

        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(spot_id)
            .bind(owner_id)
            .bind(listing.price_per_hour)
            .bind(listing.active)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(row.into())
    }

    async fn get_listing(&self, id: i64) -> DomainResult<Option<ListingEntry>> {
        let sql = format!(
            "SELECT {} FROM listing l JOIN spot s ON s.id = l.spot_id WHERE l.id = $1",
            LISTING_COLUMNS
        );
        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(row.map(ListingEntry::from))
    }

    async fn list_listings(&self, owner_id: i64, after: i64, limit: i64) -> DomainResult<Vec<ListingEntry>> {
        let sql = format!(
            r#"
            SELECT {} FROM listing l JOIN spot s ON s.id = l.spot_id
            WHERE l.owner_id = $1 AND l.id > $2
            ORDER BY l.id
            LIMIT $3
            "#,
            LISTING_COLUMNS
        );
        let rows = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(owner_id)
            .bind(after)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(rows.into_iter().map(ListingEntry::from).collect())
    }

    async fn set_active(&self, id: i64, active: bool) -> DomainResult<()> {
        let result = sqlx::query("UPDATE listing SET active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    /// Time units go with the listing; bookings keep it alive (`InUse`).
    async fn delete_listing(&self, id: i64) -> DomainResult<()> {
        sqlx::query("DELETE FROM listing WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(())
    }
}
