//! Fleet checkout
//!
//! Ciclo de vida de la hoja de salida de vehículos: alta con numeración
//! atómica, notas de inspección, evidencia fotográfica y autorización
//! contra un voucher de combustible.

pub mod config;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
pub use state::AppState;
