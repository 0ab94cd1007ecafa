//! Modelos de evidencia fotográfica
//!
//! Fotos obligatorias del vehículo (una por categoría) y fotos por ítem
//! del checklist. El contenido se guarda como bytes crudos (BYTEA).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::ParseEnumError;
use crate::utils::errors::{AppError, AppResult};

/// Categorías fijas de foto del vehículo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehiclePhotoCategory {
    Front,
    Rear,
    Left,
    Right,
    Odometer,
}

impl VehiclePhotoCategory {
    pub const ALL: [VehiclePhotoCategory; 5] = [
        VehiclePhotoCategory::Front,
        VehiclePhotoCategory::Rear,
        VehiclePhotoCategory::Left,
        VehiclePhotoCategory::Right,
        VehiclePhotoCategory::Odometer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehiclePhotoCategory::Front => "front",
            VehiclePhotoCategory::Rear => "rear",
            VehiclePhotoCategory::Left => "left",
            VehiclePhotoCategory::Right => "right",
            VehiclePhotoCategory::Odometer => "odometer",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        value
            .parse()
            .map_err(|e: ParseEnumError| AppError::Validation(e.to_string()))
    }
}

impl FromStr for VehiclePhotoCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        VehiclePhotoCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| ParseEnumError::new("vehicle photo category", s))
    }
}

impl TryFrom<String> for VehiclePhotoCategory {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for VehiclePhotoCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conjunto de categorías exigidas antes de autorizar.
/// Siempre ordenado en el orden canónico, sin duplicados y no vacío.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredCategories(Vec<VehiclePhotoCategory>);

impl Default for RequiredCategories {
    fn default() -> Self {
        Self(VehiclePhotoCategory::ALL.to_vec())
    }
}

impl RequiredCategories {
    pub fn new(categories: impl IntoIterator<Item = VehiclePhotoCategory>) -> AppResult<Self> {
        let mut categories: Vec<_> = categories.into_iter().collect();
        categories.sort();
        categories.dedup();
        if categories.is_empty() {
            return Err(AppError::Validation(
                "at least one vehicle photo category must be required".to_string(),
            ));
        }
        Ok(Self(categories))
    }

    /// Parsear una lista separada por comas ("front,rear,...")
    pub fn parse_list(value: &str) -> AppResult<Self> {
        let categories = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(VehiclePhotoCategory::parse)
            .collect::<AppResult<Vec<_>>>()?;
        Self::new(categories)
    }

    pub fn as_slice(&self) -> &[VehiclePhotoCategory] {
        &self.0
    }

    /// Categorías exigidas que no aparecen en `present`, en orden canónico
    pub fn missing_from(&self, present: &[VehiclePhotoCategory]) -> Vec<VehiclePhotoCategory> {
        self.0
            .iter()
            .copied()
            .filter(|c| !present.contains(c))
            .collect()
    }

    pub fn is_satisfied_by(&self, present: &[VehiclePhotoCategory]) -> bool {
        self.missing_from(present).is_empty()
    }
}

/// Foto obligatoria del vehículo - mapea a la tabla vehicle_photos
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VehiclePhoto {
    pub id: Uuid,
    pub company_id: i64,
    pub sheet_id: i64,
    #[sqlx(try_from = "String")]
    pub category: VehiclePhotoCategory,
    #[serde(skip)]
    pub content: Vec<u8>,
    pub filename: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Foto de un ítem del checklist - mapea a la tabla item_photos
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ItemPhoto {
    pub id: Uuid,
    pub company_id: i64,
    pub sheet_id: i64,
    pub check_item_id: i64,
    #[serde(skip)]
    pub content: Vec<u8>,
    pub filename: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadatos declarados por el cliente al subir una foto
#[derive(Debug, Clone, Default)]
pub struct PhotoMeta {
    pub filename: String,
    pub declared_mime: Option<String>,
}

/// Subida de una foto de vehículo antes de validar
#[derive(Debug, Clone)]
pub struct VehiclePhotoUpload {
    pub category: VehiclePhotoCategory,
    pub bytes: Vec<u8>,
    pub meta: PhotoMeta,
}

/// Foto ya validada: bytes canónicos, nombre saneado y MIME detectado
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPhoto {
    pub content: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
}

impl PreparedPhoto {
    pub fn size_bytes(&self) -> i64 {
        self.content.len() as i64
    }
}

#[derive(Debug, Clone)]
pub struct NewVehiclePhoto {
    pub category: VehiclePhotoCategory,
    pub photo: PreparedPhoto,
}

#[derive(Debug, Clone)]
pub struct NewItemPhoto {
    pub check_item_id: i64,
    pub photo: PreparedPhoto,
}

/// Contenido crudo de una foto para servirlo tal cual
#[derive(Debug, Clone, FromRow)]
pub struct PhotoContent {
    pub content: Vec<u8>,
    pub mime_type: String,
    pub filename: String,
}
