use std::sync::Arc;

use crate::repositories::SequenceRepository;
use crate::utils::errors::AppResult;
use crate::utils::validation::{field_error, validate_length, validate_non_negative, validate_positive};

/// Emite ids únicos y crecientes por (empresa, tipo de documento)
#[derive(Clone)]
pub struct SequenceAllocator {
    repo: Arc<dyn SequenceRepository>,
}

impl SequenceAllocator {
    pub fn new(repo: Arc<dyn SequenceRepository>) -> Self {
        Self { repo }
    }

    /// Siguiente id para la clave; falla con Allocation si el contador no existe
    pub async fn allocate(&self, company_id: i64, doc_type: &str) -> AppResult<i64> {
        validate_counter_key(company_id, doc_type)?;
        let id = self.repo.next_value(company_id, doc_type).await?;
        log::debug!("🔢 Id {} asignado para {}/{}", id, company_id, doc_type);
        Ok(id)
    }

    /// Provisionar el contador; no hace nada si ya existe
    pub async fn initialize(&self, company_id: i64, doc_type: &str, start_at: i64) -> AppResult<()> {
        validate_counter_key(company_id, doc_type)?;
        validate_non_negative(start_at).map_err(|e| field_error("start_at", e))?;
        self.repo.initialize(company_id, doc_type, start_at).await?;
        log::info!("🔢 Contador {}/{} inicializado", company_id, doc_type);
        Ok(())
    }
}

fn validate_counter_key(company_id: i64, doc_type: &str) -> AppResult<()> {
    validate_positive(company_id).map_err(|e| field_error("company_id", e))?;
    validate_length(doc_type.trim(), 1, 50).map_err(|e| field_error("doc_type", e))?;
    Ok(())
}
