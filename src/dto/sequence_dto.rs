use serde::{Deserialize, Serialize};

use crate::models::checkout_sheet::CHECKOUT_SHEET_DOC_TYPE;

// Request para provisionar un contador de documentos
#[derive(Debug, Default, Deserialize)]
pub struct InitializeSequenceRequest {
    pub doc_type: Option<String>,
    pub start_at: Option<i64>,
}

impl InitializeSequenceRequest {
    /// Sin tipo de documento se provisiona el de hojas de salida
    pub fn doc_type(&self) -> &str {
        self.doc_type
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(CHECKOUT_SHEET_DOC_TYPE)
    }
}

#[derive(Debug, Serialize)]
pub struct SequenceResponse {
    pub company_id: i64,
    pub doc_type: String,
    // start_at solo aplica si el contador no existía
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}
