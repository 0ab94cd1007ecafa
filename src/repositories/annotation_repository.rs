use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::annotation::ChecklistAnnotation;
use crate::models::checkout_sheet::SheetKey;
use crate::repositories::checkout_sheet_repository::lock_open_sheet;
use crate::repositories::PgStore;
use crate::utils::errors::AppResult;

#[async_trait]
pub trait AnnotationRepository: Send + Sync {
    /// Insertar o reemplazar la nota del ítem; la hoja debe existir y estar OPEN
    async fn upsert(
        &self,
        key: SheetKey,
        check_item_id: i64,
        text: &str,
        now: DateTime<Utc>,
    ) -> AppResult<ChecklistAnnotation>;

    async fn list_by_sheet(&self, key: SheetKey) -> AppResult<Vec<ChecklistAnnotation>>;
}

#[async_trait]
impl AnnotationRepository for PgStore {
    async fn upsert(
        &self,
        key: SheetKey,
        check_item_id: i64,
        text: &str,
        now: DateTime<Utc>,
    ) -> AppResult<ChecklistAnnotation> {
        let mut tx = self.pool().begin().await?;
        lock_open_sheet(&mut tx, key).await?;

        let annotation = sqlx::query_as::<_, ChecklistAnnotation>(
            r#"
            INSERT INTO checklist_annotations (
                id, company_id, sheet_id, check_item_id, text, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (company_id, sheet_id, check_item_id)
            DO UPDATE SET text = EXCLUDED.text, updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(key.company_id)
        .bind(key.sheet_id)
        .bind(check_item_id)
        .bind(text)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(annotation)
    }

    async fn list_by_sheet(&self, key: SheetKey) -> AppResult<Vec<ChecklistAnnotation>> {
        let annotations = sqlx::query_as::<_, ChecklistAnnotation>(
            r#"
            SELECT * FROM checklist_annotations
            WHERE company_id = $1 AND sheet_id = $2
            ORDER BY check_item_id
            "#,
        )
        .bind(key.company_id)
        .bind(key.sheet_id)
        .fetch_all(self.pool())
        .await?;

        Ok(annotations)
    }
}
