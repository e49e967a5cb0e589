//! Configuración de tasación de coches
//!
//! Coeficientes del cálculo de grade y precio optimizado. Son política de
//! negocio, por lo que se exponen como configuración con defaults sensatos
//! y overrides por variables de entorno.

use std::env;

/// Coeficientes de grading y ajuste de precio
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Penalización por rayones fuertes (la más severa)
    pub strong_scratches_penalty: f64,
    /// Penalización por averías mecánicas
    pub malfunctions_penalty: f64,
    /// Penalización por fallos eléctricos
    pub electric_failures_penalty: f64,
    /// Penalización por rayones leves (la menos severa)
    pub small_scratches_penalty: f64,
    /// Kilometraje anual considerado normal
    pub normal_annual_mileage: f64,
    /// Puntos de penalización por cada "kilometraje anual normal" recorrido al año
    pub odometer_penalty_weight: f64,
    /// Fracción del MSRP que conserva un coche con grade 0
    pub grade_price_floor: f64,
    /// Ajuste de mercado aplicado al precio final
    pub market_adjustment: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            strong_scratches_penalty: 25.0,
            malfunctions_penalty: 20.0,
            electric_failures_penalty: 20.0,
            small_scratches_penalty: 8.0,
            normal_annual_mileage: 12_000.0,
            odometer_penalty_weight: 10.0,
            grade_price_floor: 0.4,
            market_adjustment: 1.0,
        }
    }
}

impl PricingConfig {
    /// Cargar la configuración desde el entorno, con defaults para
    /// cada coeficiente que no esté definido.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            strong_scratches_penalty: env_f64(
                "GRADING_STRONG_SCRATCHES_PENALTY",
                defaults.strong_scratches_penalty,
            ),
            malfunctions_penalty: env_f64(
                "GRADING_MALFUNCTIONS_PENALTY",
                defaults.malfunctions_penalty,
            ),
            electric_failures_penalty: env_f64(
                "GRADING_ELECTRIC_FAILURES_PENALTY",
                defaults.electric_failures_penalty,
            ),
            small_scratches_penalty: env_f64(
                "GRADING_SMALL_SCRATCHES_PENALTY",
                defaults.small_scratches_penalty,
            ),
            normal_annual_mileage: env_f64(
                "GRADING_NORMAL_ANNUAL_MILEAGE",
                defaults.normal_annual_mileage,
            ),
            odometer_penalty_weight: env_f64(
                "GRADING_ODOMETER_PENALTY_WEIGHT",
                defaults.odometer_penalty_weight,
            ),
            grade_price_floor: env_f64("PRICING_GRADE_FLOOR", defaults.grade_price_floor),
            market_adjustment: env_f64("PRICING_MARKET_ADJUSTMENT", defaults.market_adjustment),
        }
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_severity_ordering() {
        // rayones fuertes > averías/fallos eléctricos > rayones leves
        let config = PricingConfig::default();
        assert!(config.strong_scratches_penalty > config.malfunctions_penalty);
        assert!(config.strong_scratches_penalty > config.electric_failures_penalty);
        assert!(config.malfunctions_penalty > config.small_scratches_penalty);
        assert!(config.electric_failures_penalty > config.small_scratches_penalty);
    }

    #[test]
    fn test_price_floor_keeps_price_positive() {
        let config = PricingConfig::default();
        assert!(config.grade_price_floor > 0.0);
        assert!(config.market_adjustment > 0.0);
    }
}
