use async_trait::async_trait;
use sqlx::PgConnection;

use crate::repositories::PgStore;
use crate::utils::errors::{AppError, AppResult};

/// Contadores de documentos por (empresa, tipo de documento)
#[async_trait]
pub trait SequenceRepository: Send + Sync {
    /// Crear el contador si no existe; `start_at` es el último valor emitido
    async fn initialize(&self, company_id: i64, doc_type: &str, start_at: i64) -> AppResult<()>;

    /// Incrementar y devolver el siguiente valor en una sola operación atómica
    async fn next_value(&self, company_id: i64, doc_type: &str) -> AppResult<i64>;
}

pub(crate) fn uninitialized_counter(company_id: i64, doc_type: &str) -> AppError {
    AppError::Allocation(format!(
        "sequence counter for company {} and document type '{}' is not initialized",
        company_id, doc_type
    ))
}

/// UPDATE ... RETURNING toma el lock de la fila del contador, así que dos
/// llamadas concurrentes para la misma clave se serializan.
pub(crate) async fn next_sequence_value(
    conn: &mut PgConnection,
    company_id: i64,
    doc_type: &str,
) -> AppResult<i64> {
    let value: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE document_sequences
        SET last_value = last_value + 1, updated_at = NOW()
        WHERE company_id = $1 AND doc_type = $2
        RETURNING last_value
        "#,
    )
    .bind(company_id)
    .bind(doc_type)
    .fetch_optional(&mut *conn)
    .await?;

    value.ok_or_else(|| uninitialized_counter(company_id, doc_type))
}

#[async_trait]
impl SequenceRepository for PgStore {
    async fn initialize(&self, company_id: i64, doc_type: &str, start_at: i64) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO document_sequences (company_id, doc_type, last_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (company_id, doc_type) DO NOTHING
            "#,
        )
        .bind(company_id)
        .bind(doc_type)
        .bind(start_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn next_value(&self, company_id: i64, doc_type: &str) -> AppResult<i64> {
        let mut conn = self.pool().acquire().await?;
        next_sequence_value(&mut conn, company_id, doc_type).await
    }
}
