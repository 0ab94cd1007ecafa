//! Modelo de anotación del checklist
//!
//! Una nota de inspección por (hoja, ítem). Un segundo registro para el
//! mismo ítem reemplaza el texto.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Anotación - mapea a la tabla checklist_annotations
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChecklistAnnotation {
    pub id: Uuid,
    pub company_id: i64,
    pub sheet_id: i64,
    pub check_item_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
