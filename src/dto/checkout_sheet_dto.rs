use serde::Deserialize;

use crate::models::checkout_sheet::{
    CreateCheckoutSheetInput, Platform, SheetFilters, SheetState,
};
use crate::utils::errors::AppResult;

// Request para abrir una hoja; la empresa viene en la ruta
#[derive(Debug, Deserialize)]
pub struct CreateCheckoutSheetRequest {
    pub platform: String,
    pub driver_id: i64,
    pub vehicle_id: i64,
    pub plate: String,
    pub odometer: i64,
    pub fuel_percentage: i16,
    pub notes: Option<String>,
}

impl CreateCheckoutSheetRequest {
    pub fn into_input(self, company_id: i64) -> CreateCheckoutSheetInput {
        CreateCheckoutSheetInput {
            company_id,
            platform: self.platform,
            driver_id: self.driver_id,
            vehicle_id: self.vehicle_id,
            plate: self.plate,
            odometer: self.odometer,
            fuel_percentage: self.fuel_percentage,
            notes: self.notes,
        }
    }
}

// Query de listado: ?platform=UBER&plate=abc&driver_name=juan&state=OPEN
#[derive(Debug, Default, Deserialize)]
pub struct ListSheetsQuery {
    pub id: Option<i64>,
    pub platform: Option<String>,
    pub plate: Option<String>,
    pub driver_name: Option<String>,
    pub state: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListSheetsQuery {
    pub fn into_filters(self, company_id: i64) -> AppResult<SheetFilters> {
        Ok(SheetFilters {
            company_id: Some(company_id),
            id: self.id,
            platform: parse_optional(self.platform, Platform::parse)?,
            plate: self.plate,
            driver_name: self.driver_name,
            state: parse_optional(self.state, SheetState::parse)?,
            limit: self.limit.unwrap_or_default(),
            offset: self.offset.unwrap_or_default(),
            ..Default::default()
        })
    }
}

// Request para registrar una nota de inspección
#[derive(Debug, Deserialize)]
pub struct AddAnnotationRequest {
    pub check_item_id: i64,
    pub text: String,
}

/// Un parámetro vacío equivale a no filtrar
pub(crate) fn parse_optional<T>(
    value: Option<String>,
    parse: fn(&str) -> AppResult<T>,
) -> AppResult<Option<T>> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => parse(v).map(Some),
        _ => Ok(None),
    }
}
