use chrono::Utc;
use std::sync::Arc;

use crate::models::annotation::ChecklistAnnotation;
use crate::models::checkout_sheet::SheetKey;
use crate::repositories::checkout_sheet_repository::sheet_not_found;
use crate::repositories::{AnnotationRepository, CheckoutSheetRepository, FleetCatalog};
use crate::utils::errors::{validation_error, AppResult};
use crate::utils::retry::retry_read;
use crate::utils::validation::{field_error, validate_length, validate_not_empty};

pub const MAX_ANNOTATION_CHARS: usize = 2000;

/// Notas de inspección por ítem del checklist.
/// Una nota por (hoja, ítem): registrar otra vez reemplaza el texto.
#[derive(Clone)]
pub struct ChecklistAnnotationStore {
    annotations: Arc<dyn AnnotationRepository>,
    sheets: Arc<dyn CheckoutSheetRepository>,
    catalog: Arc<dyn FleetCatalog>,
    read_attempts: u32,
}

impl ChecklistAnnotationStore {
    pub fn new(
        annotations: Arc<dyn AnnotationRepository>,
        sheets: Arc<dyn CheckoutSheetRepository>,
        catalog: Arc<dyn FleetCatalog>,
        read_attempts: u32,
    ) -> Self {
        Self {
            annotations,
            sheets,
            catalog,
            read_attempts,
        }
    }

    pub async fn add_annotation(
        &self,
        key: SheetKey,
        check_item_id: i64,
        text: &str,
    ) -> AppResult<ChecklistAnnotation> {
        let text = text.trim();
        validate_not_empty(text).map_err(|e| field_error("text", e))?;
        validate_length(text, 1, MAX_ANNOTATION_CHARS).map_err(|e| field_error("text", e))?;

        if self.sheets.find(key).await?.is_none() {
            return Err(sheet_not_found(key));
        }
        if !self.catalog.check_item_exists(check_item_id).await? {
            return Err(validation_error(
                "check_item_id",
                format!("check item {} is not in the catalog", check_item_id),
            ));
        }

        // El estado OPEN se vuelve a comprobar bajo el lock de la hoja
        let annotation = self
            .annotations
            .upsert(key, check_item_id, text, Utc::now())
            .await?;

        log::info!("🗒️ Anotación del ítem {} registrada en hoja {}", check_item_id, key);
        Ok(annotation)
    }

    pub async fn list_by_sheet(&self, key: SheetKey) -> AppResult<Vec<ChecklistAnnotation>> {
        if retry_read(self.read_attempts, "find_checkout_sheet", || self.sheets.find(key))
            .await?
            .is_none()
        {
            return Err(sheet_not_found(key));
        }
        retry_read(self.read_attempts, "list_annotations", || {
            self.annotations.list_by_sheet(key)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::checkout_sheet::{NewCheckoutSheet, Platform, CHECKOUT_SHEET_DOC_TYPE};
    use crate::repositories::{AuthorizationRepository, InMemoryStore, SequenceRepository};
    use crate::utils::errors::AppError;

    async fn setup() -> (Arc<InMemoryStore>, ChecklistAnnotationStore, SheetKey) {
        let store = Arc::new(InMemoryStore::new());
        store.add_check_item(10, "Espejos").await;
        store.initialize(1, CHECKOUT_SHEET_DOC_TYPE, 0).await.unwrap();
        let sheet = store
            .create(
                CHECKOUT_SHEET_DOC_TYPE,
                &NewCheckoutSheet {
                    company_id: 1,
                    platform: Platform::Bolt,
                    driver_id: 4,
                    vehicle_id: 1,
                    plate: "TEST123".to_string(),
                    odometer: 1000,
                    fuel_percentage: 50,
                    notes: None,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        let annotations =
            ChecklistAnnotationStore::new(store.clone(), store.clone(), store.clone(), 1);
        (store, annotations, sheet.key())
    }

    #[tokio::test]
    async fn test_second_note_replaces_text() {
        let (_, annotations, key) = setup().await;

        let first = annotations.add_annotation(key, 10, "mirrors OK").await.unwrap();
        let second = annotations.add_annotation(key, 10, "left mirror cracked").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        let listed = annotations.list_by_sheet(key).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].text, "left mirror cracked");
    }

    #[tokio::test]
    async fn test_add_annotation_errors() {
        let (store, annotations, key) = setup().await;

        assert!(matches!(
            annotations.add_annotation(key, 10, "   ").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            annotations.add_annotation(SheetKey::new(1, 99), 10, "ok").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            annotations.add_annotation(key, 77, "ok").await,
            Err(AppError::Validation(_))
        ));

        store.cancel(key, Utc::now()).await.unwrap();
        assert!(matches!(
            annotations.add_annotation(key, 10, "ok").await,
            Err(AppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_list_requires_sheet() {
        let (_, annotations, _) = setup().await;
        assert!(matches!(
            annotations.list_by_sheet(SheetKey::new(1, 99)).await,
            Err(AppError::NotFound(_))
        ));
    }
}
