//! Repositorios de acceso a datos
//!
//! Un repositorio por agregado, sobre el pool de PostgreSQL.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::utils::errors::AppError;

pub mod auction_repository;
pub mod bid_repository;
pub mod car_repository;
pub mod user_repository;

/// Detectar violaciones de unicidad para mapearlas a Conflict
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Recalcular la puja ganadora de un par (subasta, coche): exactamente
/// una puja queda con is_winning (máximo importe, a igualdad gana la
/// colocada antes). Debe ejecutarse dentro de la misma transacción que
/// alteró las pujas del par, sea por colocación o por borrado en cascada.
pub(crate) async fn recompute_winning_bid(
    conn: &mut PgConnection,
    auction_id: Uuid,
    car_id: Uuid,
) -> Result<(), AppError> {
    sqlx::query("UPDATE bids SET is_winning = FALSE WHERE auction_id = $1 AND car_id = $2")
        .bind(auction_id)
        .bind(car_id)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;

    sqlx::query(
        r#"
        UPDATE bids SET is_winning = TRUE
        WHERE id = (
            SELECT id FROM bids
            WHERE auction_id = $1 AND car_id = $2
            ORDER BY amount DESC, placed_at ASC
            LIMIT 1
        )
        "#,
    )
    .bind(auction_id)
    .bind(car_id)
    .execute(&mut *conn)
    .await
    .map_err(AppError::Database)?;

    Ok(())
}

/// Fixtures compartidas por las pruebas de repositorio que corren contra
/// una base de datos real (marcadas #[ignore]).
#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, Utc};
    use sqlx::PgPool;
    use uuid::Uuid;

    use crate::models::auction::Auction;

    pub async fn seed_user(pool: &PgPool, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, token_version)
            VALUES ($1, $2, $3, 'x', 'user', 0)
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(format!("{}@example.com", name))
        .execute(pool)
        .await
        .unwrap();
        id
    }

    pub async fn seed_car(pool: &PgPool, owner: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        let vin = Uuid::new_v4().simple().to_string()[..17].to_uppercase();
        sqlx::query(
            r#"
            INSERT INTO cars (id, user_id, vin, brand, model, year, odometer_value,
                              exterior_color, interior_color, msrp, grade, optimized_price)
            VALUES ($1, $2, $3, 'Toyota', 'Corolla', 2020, 30000, 'Blue', 'Black', 25000, 80, 21000)
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(vin)
        .execute(pool)
        .await
        .unwrap();
        id
    }

    /// Subasta activa (empezó hace una hora, termina en una hora) con un
    /// coche ya inscrito. Devuelve la subasta y el id del coche.
    pub async fn seed_active_auction_with_car(
        pool: &PgPool,
        created_by: Uuid,
        car_owner: Uuid,
    ) -> (Auction, Uuid) {
        let now = Utc::now();
        let auction = sqlx::query_as::<_, Auction>(
            r#"
            INSERT INTO auctions (id, name, start_date, end_date, created_by, closed_at)
            VALUES ($1, 'Subasta de prueba', $2, $3, $4, NULL)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(now - Duration::hours(1))
        .bind(now + Duration::hours(1))
        .bind(created_by)
        .fetch_one(pool)
        .await
        .unwrap();

        let car_id = seed_car(pool, car_owner).await;
        sqlx::query("INSERT INTO auction_cars (auction_id, car_id) VALUES ($1, $2)")
            .bind(auction.id)
            .bind(car_id)
            .execute(pool)
            .await
            .unwrap();

        (auction, car_id)
    }
}
