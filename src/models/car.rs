//! Modelo de Car
//!
//! Este módulo contiene el struct Car y sus variantes para CRUD operations.
//! Mapea exactamente al schema PostgreSQL; los nombres JSON siguen el
//! contrato del cliente (VIN en mayúsculas, camelCase en el resto).

use chrono::{DateTime, Utc};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::validate_vin;

/// Car - mapea exactamente a la tabla cars
#[derive(Debug, Clone, FromRow)]
pub struct Car {
    pub id: Uuid,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request para crear un nuevo coche
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCarRequest {
    #[serde(rename = "VIN")]
    #[validate(custom = "validate_vin")]
    pub vin: String,

    #[validate(length(min = 1, max = 50))]
    pub brand: String,

    #[validate(length(min = 1, max = 50))]
    pub model: String,

    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,

    #[serde(rename = "odometerValue")]
    #[validate(range(min = 0, max = 1000000))]
    pub odometer_value: i64,

    #[serde(rename = "exteriorColor")]
    #[validate(length(min = 2, max = 50))]
    pub exterior_color: String,

    #[serde(rename = "interiorColor")]
    #[validate(length(min = 2, max = 50))]
    pub interior_color: String,

    #[serde(rename = "haveStrongScratches")]
    pub has_strong_scratches: bool,

    #[serde(rename = "haveSmallScratches")]
    pub has_small_scratches: bool,

    #[serde(rename = "haveMalfunctions")]
    pub has_malfunctions: bool,

    #[serde(rename = "haveElectricFailures")]
    pub has_electric_failures: bool,

    #[validate(range(min = 1000.0, max = 10000000.0))]
    pub msrp: f64,
}

/// Request para actualizar un coche existente (parcial)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCarRequest {
    #[serde(rename = "VIN")]
    #[validate(custom = "validate_vin")]
    pub vin: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub brand: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub model: Option<String>,

    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,

    #[serde(rename = "odometerValue")]
    #[validate(range(min = 0, max = 1000000))]
    pub odometer_value: Option<i64>,

    #[serde(rename = "exteriorColor")]
    #[validate(length(min = 2, max = 50))]
    pub exterior_color: Option<String>,

    #[serde(rename = "interiorColor")]
    #[validate(length(min = 2, max = 50))]
    pub interior_color: Option<String>,

    #[serde(rename = "haveStrongScratches")]
    pub has_strong_scratches: Option<bool>,

    #[serde(rename = "haveSmallScratches")]
    pub has_small_scratches: Option<bool>,

    #[serde(rename = "haveMalfunctions")]
    pub has_malfunctions: Option<bool>,

    #[serde(rename = "haveElectricFailures")]
    pub has_electric_failures: Option<bool>,

    #[validate(range(min = 1000.0, max = 10000000.0))]
    pub msrp: Option<f64>,
}

/// Filtros para búsqueda de coches
#[derive(Debug, Default, Deserialize)]
pub struct CarFilters {
    #[serde(rename = "VIN")]
    pub vin: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    #[serde(rename = "minYear")]
    pub min_year: Option<i32>,
    #[serde(rename = "maxYear")]
    pub max_year: Option<i32>,
    #[serde(rename = "minOdometer")]
    pub min_odometer: Option<i64>,
    #[serde(rename = "maxOdometer")]
    pub max_odometer: Option<i64>,
    #[serde(rename = "userId")]
    pub user_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

/// Response de coche para la API
#[derive(Debug, Clone, Serialize)]
pub struct CarResponse {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "VIN")]
    pub vin: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    #[serde(rename = "odometerValue")]
    pub odometer_value: i64,
    #[serde(rename = "exteriorColor")]
    pub exterior_color: String,
    #[serde(rename = "interiorColor")]
    pub interior_color: String,
    #[serde(rename = "haveStrongScratches")]
    pub has_strong_scratches: bool,
    #[serde(rename = "haveSmallScratches")]
    pub has_small_scratches: bool,
    #[serde(rename = "haveMalfunctions")]
    pub has_malfunctions: bool,
    #[serde(rename = "haveElectricFailures")]
    pub has_electric_failures: bool,
    pub msrp: f64,
    pub grade: i32,
    #[serde(rename = "optimizedPrice")]
    pub optimized_price: f64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<Car> for CarResponse {
    fn from(car: Car) -> Self {
        Self {
            id: car.id,
            user_id: car.user_id,
            vin: car.vin.trim().to_string(),
            brand: car.brand,
            model: car.model,
            year: car.year,
            odometer_value: car.odometer_value,
            exterior_color: car.exterior_color,
            interior_color: car.interior_color,
            has_strong_scratches: car.has_strong_scratches,
            has_small_scratches: car.has_small_scratches,
            has_malfunctions: car.has_malfunctions,
            has_electric_failures: car.has_electric_failures,
            msrp: car.msrp.to_f64().unwrap_or(0.0),
            grade: car.grade,
            optimized_price: car.optimized_price.to_f64().unwrap_or(0.0),
            created_at: car.created_at,
            updated_at: car.updated_at,
        }
    }
}

/// Página del listado de coches
#[derive(Debug, Serialize)]
pub struct CarListResponse {
    pub cars: Vec<CarResponse>,
    pub pagination: crate::dto::PaginationInfo,
}

/// Response del endpoint de tasación GET /cars/:id/price
#[derive(Debug, Serialize)]
pub struct CarPriceResponse {
    pub car: CarPriceSummary,
    pub grade: i32,
    #[serde(rename = "marketAdjustedPrice")]
    pub market_adjusted_price: f64,
}

#[derive(Debug, Serialize)]
pub struct CarPriceSummary {
    pub id: Uuid,
    #[serde(rename = "VIN")]
    pub vin: String,
    pub year: i32,
    #[serde(rename = "odometerValue")]
    pub odometer_value: i64,
    pub msrp: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn base_request() -> CreateCarRequest {
        CreateCarRequest {
            vin: "1HGBH41JXMN109186".to_string(),
            brand: "Honda".to_string(),
            model: "Civic".to_string(),
            year: 2020,
            odometer_value: 35000,
            exterior_color: "Blue".to_string(),
            interior_color: "Black".to_string(),
            has_strong_scratches: false,
            has_small_scratches: false,
            has_malfunctions: false,
            has_electric_failures: false,
            msrp: 25000.0,
        }
    }

    #[test]
    fn test_create_car_request_valid() {
        assert!(base_request().validate().is_ok());
    }

    #[test]
    fn test_create_car_request_invalid_vin() {
        let mut request = base_request();
        request.vin = "INVALID".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_car_request_msrp_bounds() {
        let mut request = base_request();
        request.msrp = 500.0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_json_field_names_follow_client_contract() {
        let json = r#"{
            "VIN": "1HGBH41JXMN109186",
            "brand": "Honda",
            "model": "Civic",
            "year": 2020,
            "odometerValue": 35000,
            "exteriorColor": "Blue",
            "interiorColor": "Black",
            "haveStrongScratches": false,
            "haveSmallScratches": true,
            "haveMalfunctions": false,
            "haveElectricFailures": false,
            "msrp": 25000
        }"#;
        let request: CreateCarRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.vin, "1HGBH41JXMN109186");
        assert!(request.has_small_scratches);
        assert!(!request.has_strong_scratches);
    }
}
