//! Servicios del dominio
//!
//! Lógica de negocio pura: tasación de coches y ranking de pujas.

pub mod bid_ranking;
pub mod pricing_service;
