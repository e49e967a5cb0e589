use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::User;
use crate::repositories::{is_unique_violation, recompute_winning_bid};
use crate::utils::errors::{conflict_error, AppError};

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        name: String,
        email: String,
        password_hash: String,
        role: &str,
    ) -> Result<User, AppError> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, token_version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 0, $6, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(&email)
        .bind(password_hash)
        .bind(role)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                conflict_error("User", "email", &email)
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(user)
    }

    pub async fn update_password(&self, id: Uuid, password_hash: String) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Invalidar todos los tokens emitidos hasta ahora
    pub async fn bump_token_version(&self, id: Uuid) -> Result<i32, AppError> {
        let (version,): (i32,) = sqlx::query_as(
            "UPDATE users SET token_version = token_version + 1, updated_at = $2 WHERE id = $1 RETURNING token_version",
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(version)
    }

    pub async fn set_role(&self, id: Uuid, role: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET role = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(role)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user)
    }

    /// Borrado de cuenta: los coches del usuario (y con ellos sus
    /// membresías de subasta y pujas) caen en cascada. Las pujas del
    /// propio usuario sobre coches ajenos también desaparecen, así que
    /// en esos pares (subasta, coche) hay que recalcular la ganadora.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let affected: Vec<(Uuid, Uuid)> =
            sqlx::query_as("SELECT DISTINCT auction_id, car_id FROM bids WHERE user_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await
                .map_err(AppError::Database)?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        // Los pares cuyo coche cayó con el usuario quedan sin pujas y el
        // recálculo no toca nada.
        for (auction_id, car_id) in affected {
            recompute_winning_bid(&mut tx, auction_id, car_id).await?;
        }

        tx.commit().await.map_err(AppError::Database)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bid::Bid;
    use crate::repositories::bid_repository::BidRepository;
    use crate::repositories::test_support::{seed_active_auction_with_car, seed_user};

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn test_delete_promotes_next_highest_bid(pool: PgPool) {
        let admin = seed_user(&pool, "admin-del").await;
        let leader = seed_user(&pool, "leader-del").await;
        let runner_up = seed_user(&pool, "runner-up-del").await;
        let (auction, car_id) = seed_active_auction_with_car(&pool, admin, admin).await;
        let bids = BidRepository::new(pool.clone());

        bids.place_bid(&auction, car_id, runner_up, 1000)
            .await
            .unwrap();
        bids.place_bid(&auction, car_id, leader, 1100).await.unwrap();

        // la puja de leader cae en cascada; la de runner_up debe pasar
        // a ser la ganadora
        UserRepository::new(pool.clone())
            .delete(leader)
            .await
            .unwrap();

        let remaining =
            sqlx::query_as::<_, Bid>("SELECT * FROM bids WHERE auction_id = $1 AND car_id = $2")
                .bind(auction.id)
                .bind(car_id)
                .fetch_all(&pool)
                .await
                .unwrap();

        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].user_id, runner_up);
        assert!(remaining[0].is_winning);
    }
}
