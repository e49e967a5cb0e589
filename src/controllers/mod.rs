//! Controllers de la API
//!
//! Cada controller encapsula la lógica de un recurso y delega la
//! persistencia en su repository. Los handlers de routes/ los
//! construyen por petición a partir del estado compartido.

pub mod auction_controller;
pub mod auth_controller;
pub mod bid_controller;
pub mod car_controller;
