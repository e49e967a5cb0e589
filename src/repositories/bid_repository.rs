use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::PageParams;
use crate::models::auction::{Auction, AuctionStatus};
use crate::models::bid::{Bid, MyBidsFilters};
use crate::repositories::recompute_winning_bid;
use crate::utils::errors::AppError;
use crate::utils::validation::{resolve_sort_column, resolve_sort_order, BID_SORT_FIELDS};

/// Fila de puja con los datos públicos del pujador
#[derive(Debug, sqlx::FromRow)]
pub struct BidWithUserRow {
    pub id: Uuid,
    pub auction_id: Uuid,
    pub car_id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub is_winning: bool,
    pub placed_at: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
}

pub struct BidRepository {
    pool: PgPool,
}

impl BidRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Colocar o actualizar una puja.
    ///
    /// Toda la comprobación y la escritura ocurren dentro de una única
    /// transacción que toma un lock de fila sobre la membresía
    /// (auction_cars) del par (subasta, coche): dos pujas concurrentes
    /// sobre el mismo coche se serializan ahí, y pares disjuntos no se
    /// bloquean entre sí. Una carrera perdida reaparece como BidTooLow
    /// con el máximo ya actualizado.
    pub async fn place_bid(
        &self,
        auction: &Auction,
        car_id: Uuid,
        user_id: Uuid,
        amount: i64,
    ) -> Result<Bid, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Lock por (subasta, coche); de paso verifica la membresía
        let membership: Option<(Uuid,)> = sqlx::query_as(
            "SELECT car_id FROM auction_cars WHERE auction_id = $1 AND car_id = $2 FOR UPDATE",
        )
        .bind(auction.id)
        .bind(car_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        if membership.is_none() {
            return Err(AppError::NotFound(
                "Car is not part of this auction".to_string(),
            ));
        }

        // Releer la subasta dentro de la transacción, con lock compartido
        // sobre la fila: un cierre manual concurrente o bien se ve aquí
        // (closed_at ya puesto) o bien espera a que esta puja confirme.
        let fresh: Auction = sqlx::query_as("SELECT * FROM auctions WHERE id = $1 FOR SHARE")
            .bind(auction.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let now = Utc::now();
        if fresh.status_at(now) != AuctionStatus::Active {
            return Err(AppError::AuctionNotActive(
                "Bids can only be placed while the auction is active".to_string(),
            ));
        }

        // Máximo vigente excluyendo la puja previa del propio pujador,
        // que va a quedar reemplazada.
        let (current_highest,): (Option<i64>,) = sqlx::query_as(
            r#"
            SELECT MAX(amount) FROM bids
            WHERE auction_id = $1 AND car_id = $2 AND user_id != $3
            "#,
        )
        .bind(auction.id)
        .bind(car_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let current_highest = current_highest.unwrap_or(0);
        if amount <= current_highest {
            return Err(AppError::BidTooLow { current_highest });
        }

        // Upsert: una sola puja vigente por (subasta, coche, pujador)
        let bid = sqlx::query_as::<_, Bid>(
            r#"
            INSERT INTO bids (id, auction_id, car_id, user_id, amount, is_winning, placed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6, $6, $6)
            ON CONFLICT (auction_id, car_id, user_id)
            DO UPDATE SET amount = EXCLUDED.amount, placed_at = EXCLUDED.placed_at, updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(auction.id)
        .bind(car_id)
        .bind(user_id)
        .bind(amount)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        recompute_winning_bid(&mut tx, auction.id, car_id).await?;

        tx.commit().await.map_err(AppError::Database)?;

        // El RETURNING del upsert es previo al recálculo de is_winning
        let mut bid = bid;
        bid.is_winning = true;

        Ok(bid)
    }

    /// Pujas de un coche en una subasta, con datos del pujador, ordenadas
    /// por importe descendente y empates por colocación ascendente.
    pub async fn bids_for_auction(
        &self,
        auction_id: Uuid,
    ) -> Result<Vec<BidWithUserRow>, AppError> {
        let rows = sqlx::query_as::<_, BidWithUserRow>(
            r#"
            SELECT b.id, b.auction_id, b.car_id, b.user_id, b.amount, b.is_winning, b.placed_at,
                   u.name AS user_name, u.email AS user_email
            FROM bids b
            JOIN users u ON u.id = b.user_id
            WHERE b.auction_id = $1
            ORDER BY b.car_id, b.amount DESC, b.placed_at ASC
            "#,
        )
        .bind(auction_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    /// Pujas del usuario con filtros y paginación
    pub async fn my_bids(
        &self,
        user_id: Uuid,
        filters: &MyBidsFilters,
        params: PageParams,
    ) -> Result<(Vec<Bid>, i64), AppError> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM bids WHERE user_id = ");
        count_builder.push_bind(user_id);
        Self::apply_filters(&mut count_builder, filters);

        let (total,): (i64,) = count_builder
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let sort_column =
            resolve_sort_column(filters.sort_by.as_deref(), BID_SORT_FIELDS, "placed_at");
        let sort_order = resolve_sort_order(filters.sort_order.as_deref(), true);

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM bids WHERE user_id = ");
        builder.push_bind(user_id);
        Self::apply_filters(&mut builder, filters);
        builder.push(format!(" ORDER BY {} {}", sort_column, sort_order));
        builder.push(" LIMIT ");
        builder.push_bind(params.limit);
        builder.push(" OFFSET ");
        builder.push_bind(params.offset());

        let bids = builder
            .build_query_as::<Bid>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok((bids, total))
    }

    fn apply_filters(builder: &mut QueryBuilder<Postgres>, filters: &MyBidsFilters) {
        if let Some(auction_id) = filters.auction_id {
            builder.push(" AND auction_id = ");
            builder.push_bind(auction_id);
        }
        if let Some(car_id) = filters.car_id {
            builder.push(" AND car_id = ");
            builder.push_bind(car_id);
        }
    }
}

// Pruebas contra una base de datos real; corren con
// `cargo test -- --ignored` y DATABASE_URL apuntando a un Postgres local.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{seed_active_auction_with_car, seed_user};

    async fn bid_rows(pool: &PgPool, auction_id: Uuid, car_id: Uuid) -> Vec<Bid> {
        sqlx::query_as::<_, Bid>(
            "SELECT * FROM bids WHERE auction_id = $1 AND car_id = $2 ORDER BY amount DESC",
        )
        .bind(auction_id)
        .bind(car_id)
        .fetch_all(pool)
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn test_rebid_is_checked_against_others_not_own_amount(pool: PgPool) {
        let admin = seed_user(&pool, "admin-rebid").await;
        let bidder = seed_user(&pool, "bidder-rebid").await;
        let (auction, car_id) = seed_active_auction_with_car(&pool, admin, admin).await;
        let repository = BidRepository::new(pool.clone());

        repository
            .place_bid(&auction, car_id, bidder, 1000)
            .await
            .unwrap();
        // superar la propia puja no exige superar a nadie más
        let bid = repository
            .place_bid(&auction, car_id, bidder, 1100)
            .await
            .unwrap();

        assert_eq!(bid.amount, 1100);
        assert!(bid.is_winning);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn test_low_bid_rejected_without_touching_ledger(pool: PgPool) {
        let admin = seed_user(&pool, "admin-low").await;
        let high = seed_user(&pool, "high-bidder").await;
        let low = seed_user(&pool, "low-bidder").await;
        let (auction, car_id) = seed_active_auction_with_car(&pool, admin, admin).await;
        let repository = BidRepository::new(pool.clone());

        repository
            .place_bid(&auction, car_id, high, 1000)
            .await
            .unwrap();

        let err = repository
            .place_bid(&auction, car_id, low, 900)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BidTooLow { current_highest: 1000 }));

        let rows = bid_rows(&pool, auction.id, car_id).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, high);
        assert_eq!(rows[0].amount, 1000);
        assert!(rows[0].is_winning);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn test_rebid_replaces_previous_row(pool: PgPool) {
        let admin = seed_user(&pool, "admin-replace").await;
        let rival = seed_user(&pool, "rival-bidder").await;
        let bidder = seed_user(&pool, "repeat-bidder").await;
        let (auction, car_id) = seed_active_auction_with_car(&pool, admin, admin).await;
        let repository = BidRepository::new(pool.clone());

        repository
            .place_bid(&auction, car_id, rival, 1000)
            .await
            .unwrap();
        repository
            .place_bid(&auction, car_id, bidder, 1100)
            .await
            .unwrap();
        repository
            .place_bid(&auction, car_id, bidder, 1300)
            .await
            .unwrap();

        // re-pujar reemplaza la fila anterior, nunca acumula
        let rows = bid_rows(&pool, auction.id, car_id).await;
        assert_eq!(rows.len(), 2);
        let mine: Vec<_> = rows.iter().filter(|b| b.user_id == bidder).collect();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].amount, 1300);
        assert!(mine[0].is_winning);
    }
}
