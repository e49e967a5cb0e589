use chrono::{Datelike, Utc};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::config::pricing::PricingConfig;
use crate::dto::{ApiResponse, PageParams, PaginationInfo};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::car::{
    Car, CarFilters, CarListResponse, CarPriceResponse, CarPriceSummary, CarResponse,
    CreateCarRequest, UpdateCarRequest,
};
use crate::repositories::car_repository::{CarRepository, NewCar};
use crate::services::pricing_service::{compute_grade, compute_optimized_price, GradeInput};
use crate::utils::errors::{forbidden_error, not_found_error, validation_error, AppError};

pub struct CarController {
    repository: CarRepository,
    pricing: PricingConfig,
}

impl CarController {
    pub fn new(pool: sqlx::PgPool, pricing: PricingConfig) -> Self {
        Self {
            repository: CarRepository::new(pool),
            pricing,
        }
    }

    pub async fn create_car(
        &self,
        user: &AuthenticatedUser,
        request: CreateCarRequest,
    ) -> Result<ApiResponse<CarResponse>, AppError> {
        request.validate()?;
        validate_model_year(request.year)?;

        let msrp = Decimal::from_f64_retain(request.msrp)
            .ok_or_else(|| AppError::BadRequest("MSRP inválido".to_string()))?;

        let grade_input = GradeInput {
            has_strong_scratches: request.has_strong_scratches,
            has_small_scratches: request.has_small_scratches,
            has_malfunctions: request.has_malfunctions,
            has_electric_failures: request.has_electric_failures,
            odometer_value: request.odometer_value,
            year: request.year,
        };
        let grade = compute_grade(&grade_input, &self.pricing);
        let optimized_price = compute_optimized_price(msrp, grade, &self.pricing);

        let car = self
            .repository
            .create(NewCar {
                user_id: user.user_id,
                vin: request.vin,
                brand: request.brand,
                model: request.model,
                year: request.year,
                odometer_value: request.odometer_value,
                exterior_color: request.exterior_color,
                interior_color: request.interior_color,
                has_strong_scratches: request.has_strong_scratches,
                has_small_scratches: request.has_small_scratches,
                has_malfunctions: request.has_malfunctions,
                has_electric_failures: request.has_electric_failures,
                msrp,
                grade,
                optimized_price,
            })
            .await?;

        Ok(ApiResponse::success_with_message(
            car.into(),
            "Coche registrado exitosamente".to_string(),
        ))
    }

    pub async fn get_car(&self, car_id: Uuid) -> Result<ApiResponse<CarResponse>, AppError> {
        let car = self.find_car(car_id).await?;
        Ok(ApiResponse::success(car.into()))
    }

    pub async fn list_cars(
        &self,
        filters: CarFilters,
    ) -> Result<ApiResponse<CarListResponse>, AppError> {
        let params = PageParams::from_options(filters.page, filters.limit);
        let (cars, total) = self.repository.list(&filters, params).await?;

        Ok(ApiResponse::success(CarListResponse {
            cars: cars.into_iter().map(CarResponse::from).collect(),
            pagination: PaginationInfo::new(params.page, params.limit, total),
        }))
    }

    /// Actualización parcial. Cualquier cambio en flags de estado,
    /// kilometraje, año o MSRP recalcula grade y precio optimizado.
    pub async fn update_car(
        &self,
        user: &AuthenticatedUser,
        car_id: Uuid,
        request: UpdateCarRequest,
    ) -> Result<ApiResponse<CarResponse>, AppError> {
        request.validate()?;
        if let Some(year) = request.year {
            validate_model_year(year)?;
        }

        let mut car = self.find_car(car_id).await?;
        ensure_owner_or_admin(user, &car)?;

        if let Some(vin) = request.vin {
            car.vin = vin;
        }
        if let Some(brand) = request.brand {
            car.brand = brand;
        }
        if let Some(model) = request.model {
            car.model = model;
        }
        if let Some(year) = request.year {
            car.year = year;
        }
        if let Some(odometer_value) = request.odometer_value {
            car.odometer_value = odometer_value;
        }
        if let Some(exterior_color) = request.exterior_color {
            car.exterior_color = exterior_color;
        }
        if let Some(interior_color) = request.interior_color {
            car.interior_color = interior_color;
        }
        if let Some(flag) = request.has_strong_scratches {
            car.has_strong_scratches = flag;
        }
        if let Some(flag) = request.has_small_scratches {
            car.has_small_scratches = flag;
        }
        if let Some(flag) = request.has_malfunctions {
            car.has_malfunctions = flag;
        }
        if let Some(flag) = request.has_electric_failures {
            car.has_electric_failures = flag;
        }
        if let Some(msrp) = request.msrp {
            car.msrp = Decimal::from_f64_retain(msrp)
                .ok_or_else(|| AppError::BadRequest("MSRP inválido".to_string()))?;
        }

        let grade_input = GradeInput {
            has_strong_scratches: car.has_strong_scratches,
            has_small_scratches: car.has_small_scratches,
            has_malfunctions: car.has_malfunctions,
            has_electric_failures: car.has_electric_failures,
            odometer_value: car.odometer_value,
            year: car.year,
        };
        car.grade = compute_grade(&grade_input, &self.pricing);
        car.optimized_price = compute_optimized_price(car.msrp, car.grade, &self.pricing);

        let updated = self.repository.update(&car).await?;

        Ok(ApiResponse::success_with_message(
            updated.into(),
            "Coche actualizado exitosamente".to_string(),
        ))
    }

    pub async fn delete_car(&self, user: &AuthenticatedUser, car_id: Uuid) -> Result<(), AppError> {
        let car = self.find_car(car_id).await?;
        ensure_owner_or_admin(user, &car)?;

        self.repository.delete(car_id).await
    }

    /// Tasación bajo demanda con los coeficientes vigentes, sin persistir
    pub async fn get_car_price(&self, car_id: Uuid) -> Result<ApiResponse<CarPriceResponse>, AppError> {
        let car = self.find_car(car_id).await?;

        let grade_input = GradeInput {
            has_strong_scratches: car.has_strong_scratches,
            has_small_scratches: car.has_small_scratches,
            has_malfunctions: car.has_malfunctions,
            has_electric_failures: car.has_electric_failures,
            odometer_value: car.odometer_value,
            year: car.year,
        };
        let grade = compute_grade(&grade_input, &self.pricing);
        let price = compute_optimized_price(car.msrp, grade, &self.pricing);

        Ok(ApiResponse::success(CarPriceResponse {
            car: CarPriceSummary {
                id: car.id,
                vin: car.vin.trim().to_string(),
                year: car.year,
                odometer_value: car.odometer_value,
                msrp: car.msrp.to_f64().unwrap_or(0.0),
            },
            grade,
            market_adjusted_price: price.to_f64().unwrap_or(0.0),
        }))
    }

    async fn find_car(&self, car_id: Uuid) -> Result<Car, AppError> {
        self.repository
            .find_by_id(car_id)
            .await?
            .ok_or_else(|| not_found_error("Car", &car_id.to_string()))
    }
}

/// Solo el dueño del coche o un administrador pueden modificarlo
fn ensure_owner_or_admin(user: &AuthenticatedUser, car: &Car) -> Result<(), AppError> {
    if car.user_id != user.user_id && !user.is_admin() {
        return Err(forbidden_error("modify this car", "not the owner"));
    }
    Ok(())
}

/// El año de modelo no puede superar el año siguiente al actual.
/// La cota estática del request solo acota el rango razonable.
fn validate_model_year(year: i32) -> Result<(), AppError> {
    let max_year = Utc::now().year() + 1;
    if year > max_year {
        return Err(validation_error(
            "year",
            format!("Model year cannot be later than {}", max_year),
        ));
    }
    Ok(())
}
