use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::PageParams;
use crate::models::auction::{Auction, AuctionFilters};
use crate::utils::errors::AppError;
use crate::utils::validation::{resolve_sort_column, resolve_sort_order, AUCTION_SORT_FIELDS};

pub struct AuctionRepository {
    pool: PgPool,
}

impl AuctionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        name: String,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        created_by: Uuid,
    ) -> Result<Auction, AppError> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let auction = sqlx::query_as::<_, Auction>(
            r#"
            INSERT INTO auctions (id, name, start_date, end_date, created_by, closed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NULL, $6, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(start_date)
        .bind(end_date)
        .bind(created_by)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(auction)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Auction>, AppError> {
        let auction = sqlx::query_as::<_, Auction>("SELECT * FROM auctions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(auction)
    }

    /// Listado con filtro de estado derivado en SQL (misma derivación que
    /// `Auction::status_at`, expresada sobre las columnas).
    pub async fn list(
        &self,
        filters: &AuctionFilters,
        params: PageParams,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Auction>, i64), AppError> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM auctions WHERE 1=1");
        Self::apply_status_filter(&mut count_builder, filters.status.as_deref(), now);

        let (total,): (i64,) = count_builder
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let sort_column =
            resolve_sort_column(filters.sort_by.as_deref(), AUCTION_SORT_FIELDS, "start_date");
        let sort_order = resolve_sort_order(filters.sort_order.as_deref(), true);

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM auctions WHERE 1=1");
        Self::apply_status_filter(&mut builder, filters.status.as_deref(), now);
        builder.push(format!(" ORDER BY {} {}", sort_column, sort_order));
        builder.push(" LIMIT ");
        builder.push_bind(params.limit);
        builder.push(" OFFSET ");
        builder.push_bind(params.offset());

        let auctions = builder
            .build_query_as::<Auction>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok((auctions, total))
    }

    fn apply_status_filter(
        builder: &mut QueryBuilder<Postgres>,
        status: Option<&str>,
        now: DateTime<Utc>,
    ) {
        match status {
            Some("upcoming") => {
                builder.push(" AND closed_at IS NULL AND start_date > ");
                builder.push_bind(now);
            }
            Some("active") => {
                builder.push(" AND closed_at IS NULL AND start_date <= ");
                builder.push_bind(now);
                builder.push(" AND end_date >= ");
                builder.push_bind(now);
            }
            Some("ended") => {
                builder.push(" AND (closed_at IS NOT NULL OR end_date < ");
                builder.push_bind(now);
                builder.push(")");
            }
            // "all" o ausente: sin filtro
            _ => {}
        }
    }

    /// La subasta activa. Si los datos admiten varias a la vez, gana la
    /// de inicio más reciente (decisión documentada en DESIGN.md).
    pub async fn find_current(&self, now: DateTime<Utc>) -> Result<Option<Auction>, AppError> {
        let auction = sqlx::query_as::<_, Auction>(
            r#"
            SELECT * FROM auctions
            WHERE closed_at IS NULL AND start_date <= $1 AND end_date >= $1
            ORDER BY start_date DESC
            LIMIT 1
            "#,
        )
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(auction)
    }

    pub async fn update(
        &self,
        id: Uuid,
        name: String,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<Auction, AppError> {
        let auction = sqlx::query_as::<_, Auction>(
            r#"
            UPDATE auctions
            SET name = $2, start_date = $3, end_date = $4, updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(start_date)
        .bind(end_date)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(auction)
    }

    /// Cierre manual: persiste el marcador que fuerza `ended` en la
    /// derivación de estado aunque end_date no haya llegado.
    pub async fn close(&self, id: Uuid, closed_at: DateTime<Utc>) -> Result<Auction, AppError> {
        let auction = sqlx::query_as::<_, Auction>(
            "UPDATE auctions SET closed_at = $2, updated_at = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(closed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(auction)
    }

    /// Borrado de subasta. Membresías y pujas caen en cascada.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM auctions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Auction not found".to_string()));
        }

        Ok(())
    }

    pub async fn car_ids(&self, auction_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT car_id FROM auction_cars WHERE auction_id = $1 ORDER BY added_at",
        )
        .bind(auction_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Añadir coches a la subasta, todos o ninguno. Idempotente por
    /// (subasta, coche).
    pub async fn add_cars(&self, auction_id: Uuid, car_ids: &[Uuid]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        for car_id in car_ids {
            sqlx::query(
                r#"
                INSERT INTO auction_cars (auction_id, car_id, added_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (auction_id, car_id) DO NOTHING
                "#,
            )
            .bind(auction_id)
            .bind(car_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;

        Ok(())
    }

    /// Retirar un coche de la subasta (override administrativo). Sus
    /// pujas en esa subasta se eliminan en la misma transacción.
    pub async fn remove_car(&self, auction_id: Uuid, car_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let result = sqlx::query("DELETE FROM auction_cars WHERE auction_id = $1 AND car_id = $2")
            .bind(auction_id)
            .bind(car_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Car is not part of this auction".to_string()));
        }

        sqlx::query("DELETE FROM bids WHERE auction_id = $1 AND car_id = $2")
            .bind(auction_id)
            .bind(car_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{seed_active_auction_with_car, seed_car, seed_user};

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn test_add_cars_is_all_or_nothing(pool: PgPool) {
        let admin = seed_user(&pool, "admin-batch").await;
        let (auction, first_car) = seed_active_auction_with_car(&pool, admin, admin).await;
        let second_car = seed_car(&pool, admin).await;
        let repository = AuctionRepository::new(pool.clone());

        // un id inexistente en el lote: la violación de FK debe deshacer
        // también el coche válido
        let result = repository
            .add_cars(auction.id, &[second_car, Uuid::new_v4()])
            .await;
        assert!(result.is_err());

        let cars = repository.car_ids(auction.id).await.unwrap();
        assert_eq!(cars, vec![first_car]);
    }
}
