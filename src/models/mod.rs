//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL, junto con los requests/responses de la API.

pub mod auction;
pub mod bid;
pub mod car;
pub mod user;
