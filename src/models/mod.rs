//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos que mapean al schema
//! PostgreSQL de hojas de salida, evidencia y vouchers.

pub mod annotation;
pub mod authorization;
pub mod checkout_sheet;
pub mod photo;
pub mod voucher;

pub use annotation::*;
pub use authorization::*;
pub use checkout_sheet::*;
pub use photo::*;
pub use voucher::*;

/// Valor de enum desconocido (texto en BD o en la request)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
