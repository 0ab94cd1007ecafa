//! DTOs de evidencia
//!
//! Las fotos viajan en base64 dentro del JSON. Se decodifican una sola vez
//! aquí; el servicio recibe y guarda los bytes crudos.

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::annotation::ChecklistAnnotation;
use crate::models::checkout_sheet::CheckoutSheet;
use crate::models::photo::{
    ItemPhoto, PhotoMeta, VehiclePhoto, VehiclePhotoCategory, VehiclePhotoUpload,
};
use crate::services::evidence_store::EvidenceReview;
use crate::utils::errors::{validation_error, AppResult};

// Foto codificada en base64 (se acepta un prefijo data URL)
#[derive(Debug, Deserialize)]
pub struct PhotoPayload {
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub data: String,
}

impl PhotoPayload {
    pub fn decode(self) -> AppResult<(Vec<u8>, PhotoMeta)> {
        let mut declared_mime = self.mime_type;
        let mut encoded = self.data.as_str();

        // data:image/png;base64,....
        if let Some(rest) = encoded.strip_prefix("data:") {
            let (header, body) = rest
                .split_once(',')
                .ok_or_else(|| validation_error("data", "malformed data URL"))?;
            if declared_mime.is_none() {
                declared_mime = header
                    .split(';')
                    .next()
                    .map(str::to_string)
                    .filter(|m| !m.is_empty());
            }
            encoded = body;
        }

        let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| validation_error("data", format!("invalid base64: {}", e)))?;

        Ok((
            bytes,
            PhotoMeta {
                filename: self.filename.unwrap_or_default(),
                declared_mime,
            },
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct VehiclePhotoPayload {
    pub category: String,
    #[serde(flatten)]
    pub photo: PhotoPayload,
}

// Request con el juego de fotos del vehículo (hasta una por categoría)
#[derive(Debug, Deserialize)]
pub struct VehiclePhotoSetRequest {
    pub photos: Vec<VehiclePhotoPayload>,
}

impl VehiclePhotoSetRequest {
    pub fn into_uploads(self) -> AppResult<Vec<VehiclePhotoUpload>> {
        self.photos
            .into_iter()
            .map(|payload| {
                let category = VehiclePhotoCategory::parse(&payload.category)?;
                let (bytes, meta) = payload.photo.decode()?;
                Ok(VehiclePhotoUpload { category, bytes, meta })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct ItemPhotoUploadRequest {
    pub check_item_id: i64,
    #[serde(flatten)]
    pub photo: PhotoPayload,
}

// Entrada de foto en la vista de revisión, con la imagen embebida
#[derive(Debug, Serialize)]
pub struct PhotoReviewEntry {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<VehiclePhotoCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_item_id: Option<i64>,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub updated_at: DateTime<Utc>,
    pub download_url: String,
    pub data_base64: String,
}

impl PhotoReviewEntry {
    fn new(
        id: Uuid,
        category: Option<VehiclePhotoCategory>,
        check_item_id: Option<i64>,
        filename: String,
        mime_type: String,
        content: &[u8],
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            category,
            check_item_id,
            filename,
            mime_type,
            size_bytes: content.len() as i64,
            updated_at,
            download_url: format!("/api/photos/{}", id),
            data_base64: general_purpose::STANDARD.encode(content),
        }
    }
}

impl From<VehiclePhoto> for PhotoReviewEntry {
    fn from(photo: VehiclePhoto) -> Self {
        Self::new(
            photo.id,
            Some(photo.category),
            None,
            photo.filename,
            photo.mime_type,
            &photo.content,
            photo.updated_at,
        )
    }
}

impl From<ItemPhoto> for PhotoReviewEntry {
    fn from(photo: ItemPhoto) -> Self {
        Self::new(
            photo.id,
            None,
            Some(photo.check_item_id),
            photo.filename,
            photo.mime_type,
            &photo.content,
            photo.updated_at,
        )
    }
}

// Response de revisión combinada (hoja + notas + fotos)
#[derive(Debug, Serialize)]
pub struct EvidenceReviewResponse {
    pub sheet: CheckoutSheet,
    pub annotations: Vec<ChecklistAnnotation>,
    pub vehicle_photos: Vec<PhotoReviewEntry>,
    pub item_photos: Vec<PhotoReviewEntry>,
    pub missing_categories: Vec<VehiclePhotoCategory>,
    pub complete: bool,
}

impl From<EvidenceReview> for EvidenceReviewResponse {
    fn from(review: EvidenceReview) -> Self {
        Self {
            sheet: review.sheet,
            annotations: review.annotations,
            vehicle_photos: review.vehicle_photos.into_iter().map(Into::into).collect(),
            item_photos: review.item_photos.into_iter().map(Into::into).collect(),
            missing_categories: review.missing_categories,
            complete: review.complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::AppError;

    #[test]
    fn test_decode_plain_base64() {
        let payload = PhotoPayload {
            filename: Some("front.png".to_string()),
            mime_type: None,
            data: general_purpose::STANDARD.encode([1u8, 2, 3, 250]),
        };
        let (bytes, meta) = payload.decode().unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 250]);
        assert_eq!(meta.filename, "front.png");
        assert!(meta.declared_mime.is_none());
    }

    #[test]
    fn test_decode_data_url_with_line_breaks() {
        let encoded = general_purpose::STANDARD.encode([9u8; 60]);
        let (head, tail) = encoded.split_at(40);
        let payload = PhotoPayload {
            filename: None,
            mime_type: None,
            data: format!("data:image/jpeg;base64,{}\n{}", head, tail),
        };
        let (bytes, meta) = payload.decode().unwrap();
        assert_eq!(bytes, vec![9u8; 60]);
        assert_eq!(meta.declared_mime.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        let payload = PhotoPayload {
            filename: None,
            mime_type: None,
            data: "not base64!!".to_string(),
        };
        assert!(matches!(payload.decode(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_photo_set_rejects_unknown_category() {
        let request = VehiclePhotoSetRequest {
            photos: vec![VehiclePhotoPayload {
                category: "roof".to_string(),
                photo: PhotoPayload {
                    filename: None,
                    mime_type: None,
                    data: String::new(),
                },
            }],
        };
        assert!(matches!(request.into_uploads(), Err(AppError::Validation(_))));
    }
}
