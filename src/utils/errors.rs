//! Sistema de manejo de errores
//!
//! Este módulo define la taxonomía de errores del dominio
//! y su conversión a respuestas HTTP estructuradas (kind, message).

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::photo::VehiclePhotoCategory;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Incomplete evidence: missing vehicle photo categories [{}]", join_categories(.missing))]
    IncompleteEvidence { missing: Vec<VehiclePhotoCategory> },

    #[error("Voucher unavailable: {0}")]
    VoucherUnavailable(String),

    #[error("Allocation error: {0}")]
    Allocation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// Body HTTP por encima del límite configurado (solo en la frontera)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

fn join_categories(categories: &[VehiclePhotoCategory]) -> String {
    categories
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl AppError {
    /// Código estable que ve el cliente
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::IncompleteEvidence { .. } => "INCOMPLETE_EVIDENCE",
            AppError::VoucherUnavailable(_) => "VOUCHER_UNAVAILABLE",
            AppError::Allocation(_) => "ALLOCATION_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::IncompleteEvidence { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::VoucherUnavailable(_) => StatusCode::CONFLICT,
            AppError::Allocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Solo los fallos de almacenamiento pueden reintentarse (y solo en lecturas)
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Storage(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge(rejection.body_text());
        }
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    kind: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind().to_string();

        let (error, message, details) = match self {
            AppError::Validation(msg) => {
                tracing::debug!("Validation error: {}", msg);
                ("Validation Error", msg, None)
            }
            AppError::NotFound(msg) => {
                tracing::debug!("Resource not found: {}", msg);
                ("Not Found", msg, None)
            }
            AppError::InvalidState(msg) => {
                tracing::info!("Invalid state transition: {}", msg);
                ("Invalid State", msg, None)
            }
            AppError::IncompleteEvidence { missing } => {
                let message = format!(
                    "missing vehicle photo categories: {}",
                    join_categories(&missing)
                );
                tracing::info!("Incomplete evidence: {}", message);
                (
                    "Incomplete Evidence",
                    message,
                    Some(json!({ "missing_categories": missing })),
                )
            }
            AppError::VoucherUnavailable(msg) => {
                tracing::info!("Voucher unavailable: {}", msg);
                ("Voucher Unavailable", msg, None)
            }
            AppError::Allocation(msg) => {
                tracing::error!("Allocation error: {}", msg);
                ("Allocation Error", msg, None)
            }
            AppError::PayloadTooLarge(msg) => {
                tracing::info!("Payload too large: {}", msg);
                ("Payload Too Large", msg, None)
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    "Storage Error",
                    "An error occurred while accessing the database".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: error.to_string(),
            kind,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de validación de un campo
pub fn validation_error(field: &str, message: impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("{}: {}", field, message))
}
