//! Repositorios
//!
//! Cada componente recibe su interfaz de almacenamiento como trait object.
//! `PgStore` implementa todas sobre un único `PgPool`; `InMemoryStore`
//! implementa las mismas interfaces sobre mapas protegidos por un mutex.

pub mod annotation_repository;
pub mod authorization_repository;
pub mod catalog_repository;
pub mod checkout_sheet_repository;
pub mod memory_store;
pub mod photo_repository;
pub mod sequence_repository;
pub mod voucher_repository;

pub use annotation_repository::AnnotationRepository;
pub use authorization_repository::AuthorizationRepository;
pub use catalog_repository::FleetCatalog;
pub use checkout_sheet_repository::CheckoutSheetRepository;
pub use memory_store::InMemoryStore;
pub use photo_repository::PhotoRepository;
pub use sequence_repository::SequenceRepository;
pub use voucher_repository::VoucherLedger;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::utils::errors::AppResult;

/// Almacenamiento PostgreSQL compartido por todos los repositorios
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Comprobación de vida del backend, usada por `/health`
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> AppResult<()>;
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(self.pool()).await?;
        Ok(())
    }
}

/// Backend completo: todo lo que necesita `AppState`
pub trait CheckoutStore:
    StoreHealth
    + SequenceRepository
    + CheckoutSheetRepository
    + AnnotationRepository
    + PhotoRepository
    + AuthorizationRepository
    + VoucherLedger
    + FleetCatalog
    + 'static
{
}

impl<T> CheckoutStore for T where
    T: StoreHealth
        + SequenceRepository
        + CheckoutSheetRepository
        + AnnotationRepository
        + PhotoRepository
        + AuthorizationRepository
        + VoucherLedger
        + FleetCatalog
        + 'static
{
}
