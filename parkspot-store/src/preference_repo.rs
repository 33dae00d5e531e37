use async_trait::async_trait;
use parkspot_core::repository::PreferenceRepository;
use parkspot_core::{DomainError, DomainResult};
use parkspot_shared::SpotEntry;
use sqlx::PgPool;

use crate::errors::{store_error, translate};
use crate::rows::{SpotRow, SPOT_COLUMNS};

pub struct PgPreferenceRepository {
    pool: PgPool,
}

impl PgPreferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceRepository for PgPreferenceRepository {
    async fn create_preference(&self, user_id: i64, spot_id: i64) -> DomainResult<()> {
        sqlx::query("INSERT INTO preference (user_id, spot_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(spot_id)
            .execute(&self.pool)
            .await
            .map_err(|e| translate(e, DomainError::DuplicatedPreference))?;

        Ok(())
    }

    async fn preference_exists(&self, user_id: i64, spot_id: i64) -> DomainResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM preference WHERE user_id = $1 AND spot_id = $2)",
        )
        .bind(user_id)
        .bind(spot_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(exists)
    }

    async fn list_preferred(&self, user_id: i64, after: i64, limit: i64) -> DomainResult<Vec<SpotEntry>> {
        let sql = format!(
            r#"
            SELECT {} FROM preference p JOIN spot s ON s.id = p.spot_id
            WHERE p.user_id = $1
              AND s.id > $2
              AND (s.owner_id = $1
                   OR EXISTS (SELECT 1 FROM listing l WHERE l.spot_id = s.id AND l.active))
            ORDER BY s.id
            LIMIT $3
            "#,
            SPOT_COLUMNS
        );
        let rows = sqlx::query_as::<_, SpotRow>(&sql)
            .bind(user_id)
            .bind(after)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(rows.into_iter().map(SpotEntry::from).collect())
    }

    async fn delete_preference(&self, user_id: i64, spot_id: i64) -> DomainResult<()> {
        sqlx::query("DELETE FROM preference WHERE user_id = $1 AND spot_id = $2")
            .bind(user_id)
            .bind(spot_id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(())
    }
}
