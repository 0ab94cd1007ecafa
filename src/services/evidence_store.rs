//! Evidencia fotográfica de la hoja
//!
//! Valida y persiste las fotos del vehículo (una por categoría) y las fotos
//! por ítem del checklist. Los bytes llegan ya decodificados y se guardan
//! tal cual; el MIME guardado es el detectado en el contenido.

use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::annotation::ChecklistAnnotation;
use crate::models::checkout_sheet::{CheckoutSheet, SheetKey};
use crate::models::photo::{
    ItemPhoto, NewItemPhoto, NewVehiclePhoto, PhotoContent, PhotoMeta, PreparedPhoto,
    RequiredCategories, VehiclePhoto, VehiclePhotoCategory, VehiclePhotoUpload,
};
use crate::repositories::checkout_sheet_repository::{sheet_not_found, sheet_not_open};
use crate::repositories::{AnnotationRepository, CheckoutSheetRepository, FleetCatalog, PhotoRepository};
use crate::services::ServiceSettings;
use crate::utils::errors::{not_found_error, validation_error, AppError, AppResult};
use crate::utils::image::{normalize_declared_mime, verify_image};
use crate::utils::retry::retry_read;
use crate::utils::validation::{field_error, sanitize_filename, validate_length};

pub const MAX_FILENAME_CHARS: usize = 255;

/// Vista combinada para revisar la evidencia de una hoja
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceReview {
    pub sheet: CheckoutSheet,
    pub annotations: Vec<ChecklistAnnotation>,
    pub vehicle_photos: Vec<VehiclePhoto>,
    pub item_photos: Vec<ItemPhoto>,
    pub missing_categories: Vec<VehiclePhotoCategory>,
    pub complete: bool,
}

#[derive(Clone)]
pub struct EvidenceStore {
    photos: Arc<dyn PhotoRepository>,
    sheets: Arc<dyn CheckoutSheetRepository>,
    annotations: Arc<dyn AnnotationRepository>,
    catalog: Arc<dyn FleetCatalog>,
    settings: ServiceSettings,
}

impl EvidenceStore {
    pub fn new(
        photos: Arc<dyn PhotoRepository>,
        sheets: Arc<dyn CheckoutSheetRepository>,
        annotations: Arc<dyn AnnotationRepository>,
        catalog: Arc<dyn FleetCatalog>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            photos,
            sheets,
            annotations,
            catalog,
            settings,
        }
    }

    pub fn required_categories(&self) -> &RequiredCategories {
        &self.settings.required_categories
    }

    pub async fn upload_vehicle_photo(
        &self,
        key: SheetKey,
        category: VehiclePhotoCategory,
        bytes: Vec<u8>,
        meta: PhotoMeta,
    ) -> AppResult<VehiclePhoto> {
        let mut saved = self
            .upload_vehicle_photo_set(key, vec![VehiclePhotoUpload { category, bytes, meta }])
            .await?;
        saved
            .pop()
            .ok_or_else(|| AppError::Storage("vehicle photo was not returned".to_string()))
    }

    /// Subir varias categorías a la vez. El lote se guarda en una sola
    /// transacción: o entran todas las fotos o ninguna.
    pub async fn upload_vehicle_photo_set(
        &self,
        key: SheetKey,
        uploads: Vec<VehiclePhotoUpload>,
    ) -> AppResult<Vec<VehiclePhoto>> {
        if uploads.is_empty() {
            return Err(validation_error("photos", "at least one vehicle photo is required"));
        }
        let mut seen = HashSet::new();
        for upload in &uploads {
            if !seen.insert(upload.category) {
                return Err(validation_error(
                    "photos",
                    format!("category '{}' appears more than once", upload.category),
                ));
            }
        }

        self.ensure_sheet_accepts_uploads(key).await?;

        let photos = uploads
            .into_iter()
            .map(|upload| {
                let photo = self.prepare_photo(upload.bytes, upload.meta, upload.category.as_str())?;
                Ok(NewVehiclePhoto {
                    category: upload.category,
                    photo,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let saved = self
            .photos
            .upsert_vehicle_photos(key, &photos, Utc::now())
            .await?;

        log::info!(
            "📸 {} foto(s) de vehículo guardadas en hoja {}: [{}]",
            saved.len(),
            key,
            saved
                .iter()
                .map(|p| p.category.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(saved)
    }

    pub async fn upload_item_photo(
        &self,
        key: SheetKey,
        check_item_id: i64,
        bytes: Vec<u8>,
        meta: PhotoMeta,
    ) -> AppResult<ItemPhoto> {
        self.ensure_sheet_accepts_uploads(key).await?;
        if !self.catalog.check_item_exists(check_item_id).await? {
            return Err(validation_error(
                "check_item_id",
                format!("check item {} is not in the catalog", check_item_id),
            ));
        }

        let photo = self.prepare_photo(bytes, meta, &format!("item-{}", check_item_id))?;
        let saved = self
            .photos
            .insert_item_photo(key, &NewItemPhoto { check_item_id, photo }, Utc::now())
            .await?;

        log::info!(
            "📸 Foto del ítem {} guardada en hoja {} ({} bytes)",
            check_item_id,
            key,
            saved.size_bytes
        );
        Ok(saved)
    }

    pub async fn get_vehicle_photos_for_sheet(&self, key: SheetKey) -> AppResult<Vec<VehiclePhoto>> {
        self.require_sheet(key).await?;
        retry_read(self.settings.read_retry_attempts, "list_vehicle_photos", || {
            self.photos.vehicle_photos(key)
        })
        .await
    }

    pub async fn get_item_photos_for_sheet(&self, key: SheetKey) -> AppResult<Vec<ItemPhoto>> {
        self.require_sheet(key).await?;
        retry_read(self.settings.read_retry_attempts, "list_item_photos", || {
            self.photos.item_photos(key)
        })
        .await
    }

    /// Bytes crudos y MIME de una foto, para servirla sin envoltorio JSON
    pub async fn fetch_photo_bytes(&self, photo_id: Uuid) -> AppResult<PhotoContent> {
        retry_read(self.settings.read_retry_attempts, "fetch_photo_bytes", || {
            self.photos.photo_content(photo_id)
        })
        .await?
        .ok_or_else(|| not_found_error("Photo", photo_id))
    }

    pub async fn has_all_required_vehicle_photos(&self, key: SheetKey) -> AppResult<bool> {
        let present = self.present_categories(key).await?;
        Ok(self.settings.required_categories.is_satisfied_by(&present))
    }

    pub async fn missing_vehicle_categories(
        &self,
        key: SheetKey,
    ) -> AppResult<Vec<VehiclePhotoCategory>> {
        let present = self.present_categories(key).await?;
        Ok(self.settings.required_categories.missing_from(&present))
    }

    /// Categorías con al menos una foto, leídas de una sola instantánea
    async fn present_categories(&self, key: SheetKey) -> AppResult<Vec<VehiclePhotoCategory>> {
        self.require_sheet(key).await?;
        retry_read(self.settings.read_retry_attempts, "present_categories", || {
            self.photos.present_categories(key)
        })
        .await
    }

    pub async fn evidence_review(&self, key: SheetKey) -> AppResult<EvidenceReview> {
        let sheet = self.require_sheet(key).await?;
        let attempts = self.settings.read_retry_attempts;

        let (annotations, vehicle_photos, item_photos) = futures::try_join!(
            retry_read(attempts, "list_annotations", || self.annotations.list_by_sheet(key)),
            retry_read(attempts, "list_vehicle_photos", || self.photos.vehicle_photos(key)),
            retry_read(attempts, "list_item_photos", || self.photos.item_photos(key)),
        )?;

        let present: Vec<VehiclePhotoCategory> = vehicle_photos.iter().map(|p| p.category).collect();
        let missing_categories = self.settings.required_categories.missing_from(&present);

        Ok(EvidenceReview {
            sheet,
            annotations,
            vehicle_photos,
            item_photos,
            complete: missing_categories.is_empty(),
            missing_categories,
        })
    }

    async fn require_sheet(&self, key: SheetKey) -> AppResult<CheckoutSheet> {
        retry_read(self.settings.read_retry_attempts, "find_checkout_sheet", || {
            self.sheets.find(key)
        })
        .await?
        .ok_or_else(|| sheet_not_found(key))
    }

    /// Comprobación previa; la escritura vuelve a exigir OPEN bajo el lock
    async fn ensure_sheet_accepts_uploads(&self, key: SheetKey) -> AppResult<()> {
        let sheet = self.sheets.find(key).await?.ok_or_else(|| sheet_not_found(key))?;
        if !sheet.is_open() {
            return Err(sheet_not_open(key, sheet.state));
        }
        Ok(())
    }

    /// Validar tamaño, formato y nombre de archivo de una foto
    fn prepare_photo(&self, bytes: Vec<u8>, meta: PhotoMeta, fallback_stem: &str) -> AppResult<PreparedPhoto> {
        if bytes.is_empty() {
            return Err(validation_error("content", "photo payload is empty"));
        }
        if bytes.len() > self.settings.max_upload_bytes {
            return Err(validation_error(
                "content",
                format!(
                    "photo is {} bytes, maximum allowed is {}",
                    bytes.len(),
                    self.settings.max_upload_bytes
                ),
            ));
        }

        let image = verify_image(&bytes).map_err(|e| validation_error("content", e.to_string()))?;
        let mime_type = image.mime_type();

        if let Some(declared) = meta.declared_mime.as_deref().filter(|d| !d.trim().is_empty()) {
            let declared = normalize_declared_mime(declared);
            if declared != mime_type {
                return Err(validation_error(
                    "mime_type",
                    format!("declared '{}' but content is '{}'", declared, mime_type),
                ));
            }
        }

        let mut filename = sanitize_filename(&meta.filename);
        if filename.is_empty() {
            filename = format!("{}.{}", fallback_stem, image.extension());
        }
        validate_length(&filename, 1, MAX_FILENAME_CHARS).map_err(|e| field_error("filename", e))?;

        Ok(PreparedPhoto {
            content: bytes,
            filename,
            mime_type: mime_type.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::checkout_sheet::{NewCheckoutSheet, Platform, CHECKOUT_SHEET_DOC_TYPE};
    use crate::repositories::{InMemoryStore, SequenceRepository};
    use crate::utils::image::fixtures::{jpeg, png};
    use crate::utils::image::{MIME_JPEG, MIME_PNG};

    async fn setup(settings: ServiceSettings) -> (EvidenceStore, SheetKey) {
        let store = Arc::new(InMemoryStore::new());
        store.add_check_item(10, "Espejos").await;
        store.initialize(1, CHECKOUT_SHEET_DOC_TYPE, 0).await.unwrap();
        let sheet = store
            .create(
                CHECKOUT_SHEET_DOC_TYPE,
                &NewCheckoutSheet {
                    company_id: 1,
                    platform: Platform::Uber,
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
        let evidence = EvidenceStore::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            settings,
        );
        (evidence, sheet.key())
    }

    fn meta(filename: &str, declared: Option<&str>) -> PhotoMeta {
        PhotoMeta {
            filename: filename.to_string(),
            declared_mime: declared.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_upload_stores_raw_bytes() {
        let (evidence, key) = setup(ServiceSettings::default()).await;
        let photo = evidence
            .upload_vehicle_photo(key, VehiclePhotoCategory::Front, jpeg(), meta("C:\\fotos\\front.jpg", Some("image/jpg")))
            .await
            .unwrap();

        assert_eq!(photo.mime_type, MIME_JPEG);
        assert_eq!(photo.filename, "front.jpg");
        assert_eq!(photo.size_bytes, jpeg().len() as i64);

        let content = evidence.fetch_photo_bytes(photo.id).await.unwrap();
        assert_eq!(content.content, jpeg());
        assert_eq!(content.mime_type, MIME_JPEG);
    }

    #[tokio::test]
    async fn test_upload_rejects_invalid_payloads() {
        let (evidence, key) = setup(ServiceSettings {
            max_upload_bytes: 8,
            ..Default::default()
        })
        .await;

        let too_big = evidence
            .upload_vehicle_photo(key, VehiclePhotoCategory::Rear, jpeg(), meta("a.jpg", None))
            .await;
        assert!(matches!(too_big, Err(AppError::Validation(_))));

        let (evidence, key) = setup(ServiceSettings::default()).await;
        let not_image = evidence
            .upload_vehicle_photo(key, VehiclePhotoCategory::Rear, b"/9j/4AAQSkZJRg==".to_vec(), meta("a.jpg", None))
            .await;
        assert!(matches!(not_image, Err(AppError::Validation(_))));

        let wrong_mime = evidence
            .upload_vehicle_photo(key, VehiclePhotoCategory::Rear, jpeg(), meta("a.png", Some("image/png")))
            .await;
        assert!(matches!(wrong_mime, Err(AppError::Validation(_))));

        let empty = evidence
            .upload_vehicle_photo(key, VehiclePhotoCategory::Rear, Vec::new(), meta("a.jpg", None))
            .await;
        assert!(matches!(empty, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_png_header_with_garbage_is_not_stored() {
        let (evidence, key) = setup(ServiceSettings::default()).await;

        // firma + chunk IHDR reales, el resto no es una imagen
        let mut forged = png(2)[..16].to_vec();
        forged.extend_from_slice(b"this is definitely not an image");
        let result = evidence
            .upload_vehicle_photo(key, VehiclePhotoCategory::Front, forged, meta("front.png", None))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(evidence.get_vehicle_photos_for_sheet(key).await.unwrap().is_empty());

        let stored = evidence
            .upload_vehicle_photo(key, VehiclePhotoCategory::Front, png(2), meta("front.png", Some("image/png")))
            .await
            .unwrap();
        assert_eq!(stored.mime_type, MIME_PNG);
    }

    #[tokio::test]
    async fn test_photo_set_rejects_duplicate_categories() {
        let (evidence, key) = setup(ServiceSettings::default()).await;
        let uploads = vec![
            VehiclePhotoUpload {
                category: VehiclePhotoCategory::Left,
                bytes: jpeg(),
                meta: PhotoMeta::default(),
            },
            VehiclePhotoUpload {
                category: VehiclePhotoCategory::Left,
                bytes: jpeg(),
                meta: PhotoMeta::default(),
            },
        ];
        assert!(matches!(
            evidence.upload_vehicle_photo_set(key, uploads).await,
            Err(AppError::Validation(_))
        ));
        assert!(evidence.get_vehicle_photos_for_sheet(key).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_completeness_follows_required_set() {
        let required = RequiredCategories::parse_list("front,odometer").unwrap();
        let (evidence, key) = setup(ServiceSettings {
            required_categories: required,
            ..Default::default()
        })
        .await;

        evidence
            .upload_vehicle_photo(key, VehiclePhotoCategory::Front, jpeg(), PhotoMeta::default())
            .await
            .unwrap();
        assert_eq!(
            evidence.missing_vehicle_categories(key).await.unwrap(),
            vec![VehiclePhotoCategory::Odometer]
        );

        let photo = evidence
            .upload_vehicle_photo(key, VehiclePhotoCategory::Odometer, jpeg(), PhotoMeta::default())
            .await
            .unwrap();
        assert_eq!(photo.filename, "odometer.jpg");
        assert!(evidence.has_all_required_vehicle_photos(key).await.unwrap());
    }

    #[tokio::test]
    async fn test_item_photos_append_and_review() {
        let (evidence, key) = setup(ServiceSettings::default()).await;

        for _ in 0..2 {
            evidence
                .upload_item_photo(key, 10, jpeg(), meta("espejo.jpg", None))
                .await
                .unwrap();
        }
        assert!(matches!(
            evidence.upload_item_photo(key, 99, jpeg(), PhotoMeta::default()).await,
            Err(AppError::Validation(_))
        ));

        let review = evidence.evidence_review(key).await.unwrap();
        assert_eq!(review.item_photos.len(), 2);
        assert!(!review.complete);
        assert_eq!(review.missing_categories.len(), 5);
    }

    #[tokio::test]
    async fn test_missing_photo_and_sheet() {
        let (evidence, _) = setup(ServiceSettings::default()).await;
        assert!(matches!(
            evidence.fetch_photo_bytes(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            evidence
                .upload_vehicle_photo(SheetKey::new(1, 99), VehiclePhotoCategory::Front, jpeg(), PhotoMeta::default())
                .await,
            Err(AppError::NotFound(_))
        ));
    }
}
