use async_trait::async_trait;
use parkspot_core::repository::CarRepository;
use parkspot_core::{DomainResult, Resolve, Resolved};
use parkspot_shared::pii::Masked;
use parkspot_shared::{Car, CarEntry};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::store_error;
use crate::rows::ResolvedRow;

pub struct PgCarRepository {
    pool: PgPool,
}

impl PgCarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CarRow {
    id: i64,
    uuid: Uuid,
    owner_id: i64,
    licence_plate: String,
    make: Option<String>,
    model: Option<String>,
}

impl From<CarRow> for CarEntry {
    fn from(row: CarRow) -> Self {
        CarEntry {
            id: row.id,
            uuid: row.uuid,
            owner_id: row.owner_id,
            car: Car { licence_plate: Masked(row.licence_plate), make: row.make, model: row.model },
        }
    }
}

/// Cars are never public.
#[async_trait]
impl Resolve for PgCarRepository {
    async fn resolve(&self, uuid: Uuid) -> DomainResult<Option<Resolved>> {
        let row = sqlx::query_as::<_, ResolvedRow>(
            "SELECT id, owner_id, FALSE AS is_public FROM car WHERE uuid = $1",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(Resolved::from))
    }
}

#[async_trait]
impl CarRepository for PgCarRepository {
    async fn create_car(&self, owner_id: i64, car: &Car) -> DomainResult<CarEntry> {
        let row = sqlx::query_as::<_, CarRow>(
            r#"
            INSERT INTO car (uuid, owner_id, licence_plate, make, model)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, uuid, owner_id, licence_plate, make, model
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(car.licence_plate.expose())
        .bind(&car.make)
        .bind(&car.model)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        tracing::info!("Registered car {} ({})", row.uuid, car.licence_plate);
        Ok(row.into())
    }
}
