use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::PageParams;
use crate::models::car::{Car, CarFilters};
use crate::repositories::is_unique_violation;
use crate::utils::errors::{conflict_error, AppError};
use crate::utils::validation::{resolve_sort_column, resolve_sort_order, CAR_SORT_FIELDS};

pub struct CarRepository {
    pool: PgPool,
}

/// Campos persistibles de un coche nuevo, con los derivados ya calculados
pub struct NewCar {
    pub user_id: Uuid,
    pub vin: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub odometer_value: i64,
    pub exterior_color: String,
    pub interior_color: String,
    pub has_strong_scratches: bool,
    pub has_small_scratches: bool,
    pub has_malfunctions: bool,
    pub has_electric_failures: bool,
    pub msrp: Decimal,
    pub grade: i32,
    pub optimized_price: Decimal,
}

impl CarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_car: NewCar) -> Result<Car, AppError> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let car = sqlx::query_as::<_, Car>(
            r#"
            INSERT INTO cars (
                id, user_id, vin, brand, model, year, odometer_value,
                exterior_color, interior_color,
                has_strong_scratches, has_small_scratches, has_malfunctions, has_electric_failures,
                msrp, grade, optimized_price, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $17)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(new_car.user_id)
        .bind(&new_car.vin)
        .bind(new_car.brand)
        .bind(new_car.model)
        .bind(new_car.year)
        .bind(new_car.odometer_value)
        .bind(new_car.exterior_color)
        .bind(new_car.interior_color)
        .bind(new_car.has_strong_scratches)
        .bind(new_car.has_small_scratches)
        .bind(new_car.has_malfunctions)
        .bind(new_car.has_electric_failures)
        .bind(new_car.msrp)
        .bind(new_car.grade)
        .bind(new_car.optimized_price)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                conflict_error("Car", "VIN", &new_car.vin)
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(car)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Car>, AppError> {
        let car = sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(car)
    }

    /// Listado con filtros, paginación y ordenación por whitelist
    pub async fn list(
        &self,
        filters: &CarFilters,
        params: PageParams,
    ) -> Result<(Vec<Car>, i64), AppError> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM cars WHERE 1=1");
        Self::apply_filters(&mut count_builder, filters);

        let (total,): (i64,) = count_builder
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let sort_column = resolve_sort_column(filters.sort_by.as_deref(), CAR_SORT_FIELDS, "created_at");
        let sort_order = resolve_sort_order(filters.order.as_deref(), true);

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM cars WHERE 1=1");
        Self::apply_filters(&mut builder, filters);
        builder.push(format!(" ORDER BY {} {}", sort_column, sort_order));
        builder.push(" LIMIT ");
        builder.push_bind(params.limit);
        builder.push(" OFFSET ");
        builder.push_bind(params.offset());

        let cars = builder
            .build_query_as::<Car>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok((cars, total))
    }

    fn apply_filters(builder: &mut QueryBuilder<Postgres>, filters: &CarFilters) {
        if let Some(vin) = &filters.vin {
            builder.push(" AND vin = ");
            builder.push_bind(vin.clone());
        }
        if let Some(brand) = &filters.brand {
            builder.push(" AND brand ILIKE ");
            builder.push_bind(format!("%{}%", brand));
        }
        if let Some(model) = &filters.model {
            builder.push(" AND model ILIKE ");
            builder.push_bind(format!("%{}%", model));
        }
        if let Some(min_year) = filters.min_year {
            builder.push(" AND year >= ");
            builder.push_bind(min_year);
        }
        if let Some(max_year) = filters.max_year {
            builder.push(" AND year <= ");
            builder.push_bind(max_year);
        }
        if let Some(min_odometer) = filters.min_odometer {
            builder.push(" AND odometer_value >= ");
            builder.push_bind(min_odometer);
        }
        if let Some(max_odometer) = filters.max_odometer {
            builder.push(" AND odometer_value <= ");
            builder.push_bind(max_odometer);
        }
        if let Some(user_id) = filters.user_id {
            builder.push(" AND user_id = ");
            builder.push_bind(user_id);
        }
    }

    /// Persistir un coche ya parcheado (el controller aplica el patch y
    /// recalcula grade/optimized_price antes de llamar aquí).
    pub async fn update(&self, car: &Car) -> Result<Car, AppError> {
        let updated = sqlx::query_as::<_, Car>(
            r#"
            UPDATE cars
            SET vin = $2, brand = $3, model = $4, year = $5, odometer_value = $6,
                exterior_color = $7, interior_color = $8,
                has_strong_scratches = $9, has_small_scratches = $10,
                has_malfunctions = $11, has_electric_failures = $12,
                msrp = $13, grade = $14, optimized_price = $15, updated_at = $16
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(car.id)
        .bind(&car.vin)
        .bind(&car.brand)
        .bind(&car.model)
        .bind(car.year)
        .bind(car.odometer_value)
        .bind(&car.exterior_color)
        .bind(&car.interior_color)
        .bind(car.has_strong_scratches)
        .bind(car.has_small_scratches)
        .bind(car.has_malfunctions)
        .bind(car.has_electric_failures)
        .bind(car.msrp)
        .bind(car.grade)
        .bind(car.optimized_price)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                conflict_error("Car", "VIN", &car.vin)
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(updated)
    }

    /// Borrar un coche. Las cascadas del schema lo retiran de toda
    /// subasta y eliminan sus pujas.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Car not found".to_string()));
        }

        Ok(())
    }

    /// De una lista de ids, devolver los que NO existen
    pub async fn find_missing(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        let existing: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM cars WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let existing: std::collections::HashSet<Uuid> =
            existing.into_iter().map(|(id,)| id).collect();

        Ok(ids
            .iter()
            .copied()
            .filter(|id| !existing.contains(id))
            .collect())
    }
}
