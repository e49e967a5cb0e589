//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::config::pricing::PricingConfig;
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub pricing: PricingConfig,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig, pricing: PricingConfig) -> Self {
        Self {
            pool,
            config,
            pricing,
        }
    }

    /// Configuración JWT derivada del entorno
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::from(&self.config)
    }
}
