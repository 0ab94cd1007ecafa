//! Services module
//!
//! Este módulo contiene la lógica de negocio del ciclo de vida de la hoja
//! de salida. Cada servicio recibe sus interfaces de almacenamiento
//! inyectadas y no guarda estado de las hojas en memoria.

pub mod annotation_store;
pub mod authorization_gate;
pub mod checkout_sheet_service;
pub mod evidence_store;
pub mod sequence_allocator;

pub use annotation_store::*;
pub use authorization_gate::*;
pub use checkout_sheet_service::*;
pub use evidence_store::*;
pub use sequence_allocator::*;

use crate::models::photo::RequiredCategories;

/// 5 MiB por foto
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_READ_RETRY_ATTEMPTS: u32 = 3;

/// Parámetros de negocio compartidos por los servicios
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub max_upload_bytes: usize,
    pub read_retry_attempts: u32,
    pub required_categories: RequiredCategories,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            read_retry_attempts: DEFAULT_READ_RETRY_ATTEMPTS,
            required_categories: RequiredCategories::default(),
        }
    }
}
