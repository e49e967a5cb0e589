//! Configuración del proyecto
//!
//! Este módulo contiene la configuración de variables de entorno
//! y los coeficientes de tasación del sistema.

pub mod environment;
pub mod pricing;

pub use environment::*;
pub use pricing::*;
