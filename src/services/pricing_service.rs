//! Servicio de tasación
//!
//! Cálculo puro del grade (0-100) y del precio optimizado de un coche.
//! Los coeficientes vienen de `PricingConfig`; el Car Registry recalcula
//! ambos derivados cada vez que cambian los flags de estado, el
//! kilometraje, el año o el MSRP.

use chrono::{Datelike, Utc};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::pricing::PricingConfig;

/// Entradas del cálculo de grade
#[derive(Debug, Clone, Copy)]
pub struct GradeInput {
    pub has_strong_scratches: bool,
    pub has_small_scratches: bool,
    pub has_malfunctions: bool,
    pub has_electric_failures: bool,
    pub odometer_value: i64,
    pub year: i32,
}

/// Calcular el grade de condición: se parte de 100, se restan las
/// penalizaciones fijas por cada flag y una penalización de kilometraje
/// escalada por la edad del coche, y se recorta a [0, 100].
pub fn compute_grade(input: &GradeInput, config: &PricingConfig) -> i32 {
    let mut score = 100.0;

    if input.has_strong_scratches {
        score -= config.strong_scratches_penalty;
    }
    if input.has_malfunctions {
        score -= config.malfunctions_penalty;
    }
    if input.has_electric_failures {
        score -= config.electric_failures_penalty;
    }
    if input.has_small_scratches {
        score -= config.small_scratches_penalty;
    }

    score -= odometer_penalty(input.odometer_value, input.year, config);

    score.clamp(0.0, 100.0).round() as i32
}

/// Penalización por kilometraje ajustada por edad: un coche viejo con
/// mucho kilometraje castiga menos que uno reciente con el mismo odómetro.
fn odometer_penalty(odometer_value: i64, year: i32, config: &PricingConfig) -> f64 {
    let current_year = Utc::now().year();
    let age_years = (current_year - year).max(1) as f64;
    let annual_mileage = odometer_value as f64 / age_years;

    config.odometer_penalty_weight * (annual_mileage / config.normal_annual_mileage)
}

/// Precio optimizado: MSRP × f(grade) × ajuste de mercado, con
/// f(grade) = floor + (1 - floor) × grade/100. Monótono creciente en el
/// grade y siempre positivo mientras el MSRP lo sea.
pub fn compute_optimized_price(msrp: Decimal, grade: i32, config: &PricingConfig) -> Decimal {
    let grade_factor =
        config.grade_price_floor + (1.0 - config.grade_price_floor) * (grade as f64 / 100.0);
    let multiplier = grade_factor * config.market_adjustment;

    let msrp_f = msrp.to_f64().unwrap_or(0.0);
    Decimal::from_f64_retain(msrp_f * multiplier)
        .unwrap_or(msrp)
        .round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pristine(odometer: i64, year: i32) -> GradeInput {
        GradeInput {
            has_strong_scratches: false,
            has_small_scratches: false,
            has_malfunctions: false,
            has_electric_failures: false,
            odometer_value: odometer,
            year,
        }
    }

    #[test]
    fn test_pristine_car_gets_maximum_grade() {
        // sin daños y odómetro a cero: grade máximo
        let config = PricingConfig::default();
        let grade = compute_grade(&pristine(0, 2023), &config);
        assert_eq!(grade, 100);
    }

    #[test]
    fn test_wrecked_high_mileage_car_near_zero_never_negative() {
        let config = PricingConfig::default();
        let input = GradeInput {
            has_strong_scratches: true,
            has_small_scratches: true,
            has_malfunctions: true,
            has_electric_failures: true,
            odometer_value: 900_000,
            year: 2020,
        };
        let grade = compute_grade(&input, &config);
        assert!(grade >= 0);
        assert!(grade <= 10);
    }

    #[test]
    fn test_grade_clamped_to_valid_range() {
        let config = PricingConfig::default();
        for odometer in [0i64, 50_000, 500_000, 1_000_000] {
            for year in [1990, 2010, 2024] {
                let grade = compute_grade(&pristine(odometer, year), &config);
                assert!((0..=100).contains(&grade), "grade {} fuera de rango", grade);
            }
        }
    }

    #[test]
    fn test_strong_scratches_penalize_more_than_small() {
        let config = PricingConfig::default();
        let mut strong = pristine(0, 2023);
        strong.has_strong_scratches = true;
        let mut small = pristine(0, 2023);
        small.has_small_scratches = true;

        assert!(compute_grade(&strong, &config) < compute_grade(&small, &config));
    }

    #[test]
    fn test_age_adjustment_softens_mileage() {
        // mismo odómetro: el coche más viejo conserva mejor grade
        let config = PricingConfig::default();
        let old = compute_grade(&pristine(120_000, 2010), &config);
        let recent = compute_grade(&pristine(120_000, 2022), &config);
        assert!(old > recent);
    }

    #[test]
    fn test_optimized_price_monotonic_in_grade() {
        let config = PricingConfig::default();
        let msrp = Decimal::new(25_000_00, 2);
        let mut previous = Decimal::ZERO;
        for grade in [0, 25, 50, 75, 100] {
            let price = compute_optimized_price(msrp, grade, &config);
            assert!(price > previous, "precio no monótono en grade {}", grade);
            previous = price;
        }
    }

    #[test]
    fn test_optimized_price_positive_even_at_grade_zero() {
        let config = PricingConfig::default();
        let price = compute_optimized_price(Decimal::new(1_000_00, 2), 0, &config);
        assert!(price > Decimal::ZERO);
    }

    #[test]
    fn test_perfect_grade_keeps_msrp_at_neutral_market() {
        let config = PricingConfig::default();
        let msrp = Decimal::new(30_000_00, 2);
        let price = compute_optimized_price(msrp, 100, &config);
        assert_eq!(price, msrp.round_dp(2));
    }
}
