use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use crate::models::checkout_sheet::{
    CheckoutSheet, CreateCheckoutSheetInput, NewCheckoutSheet, Platform, SheetFilters, SheetKey,
    CHECKOUT_SHEET_DOC_TYPE,
};
use crate::repositories::checkout_sheet_repository::sheet_not_found;
use crate::repositories::{CheckoutSheetRepository, FleetCatalog};
use crate::utils::errors::{validation_error, AppResult};
use crate::utils::retry::retry_read;
use crate::utils::validation::{
    field_error, normalize_plate, validate_license_plate, validate_non_negative,
    validate_positive, validate_range,
};

/// Cabecera de la hoja: alta, consulta y listados
#[derive(Clone)]
pub struct CheckoutSheetService {
    sheets: Arc<dyn CheckoutSheetRepository>,
    catalog: Arc<dyn FleetCatalog>,
    read_attempts: u32,
}

impl CheckoutSheetService {
    pub fn new(
        sheets: Arc<dyn CheckoutSheetRepository>,
        catalog: Arc<dyn FleetCatalog>,
        read_attempts: u32,
    ) -> Self {
        Self {
            sheets,
            catalog,
            read_attempts,
        }
    }

    /// Abrir una hoja nueva. El id se asigna dentro de la misma transacción
    /// que inserta la cabecera y es el que usan todas las escrituras hijas.
    pub async fn create(&self, input: CreateCheckoutSheetInput) -> AppResult<CheckoutSheet> {
        let new_sheet = self.validate_input(input).await?;

        let sheet = self
            .sheets
            .create(CHECKOUT_SHEET_DOC_TYPE, &new_sheet, Utc::now())
            .await?;

        log::info!(
            "📝 Hoja {} creada: plataforma {}, vehículo {} ({})",
            sheet.key(),
            sheet.platform,
            sheet.vehicle_id,
            sheet.plate
        );
        Ok(sheet)
    }

    pub async fn get(&self, key: SheetKey) -> AppResult<CheckoutSheet> {
        retry_read(self.read_attempts, "get_checkout_sheet", || self.sheets.find(key))
            .await?
            .ok_or_else(|| sheet_not_found(key))
    }

    pub async fn list(&self, filters: SheetFilters) -> AppResult<Vec<CheckoutSheet>> {
        let filters = filters.normalized();
        retry_read(self.read_attempts, "list_checkout_sheets", || {
            self.sheets.list(&filters)
        })
        .await
    }

    async fn validate_input(&self, input: CreateCheckoutSheetInput) -> AppResult<NewCheckoutSheet> {
        input.validate()?;

        validate_positive(input.company_id).map_err(|e| field_error("company_id", e))?;
        validate_positive(input.driver_id).map_err(|e| field_error("driver_id", e))?;
        validate_positive(input.vehicle_id).map_err(|e| field_error("vehicle_id", e))?;
        validate_non_negative(input.odometer).map_err(|e| field_error("odometer", e))?;
        validate_range(input.fuel_percentage, 0, 100)
            .map_err(|e| field_error("fuel_percentage", e))?;

        let platform = Platform::parse(&input.platform)?;

        let plate = normalize_plate(&input.plate);
        validate_license_plate(&plate).map_err(|e| field_error("plate", e))?;

        if !self.catalog.driver_exists(input.driver_id).await? {
            return Err(validation_error(
                "driver_id",
                format!("driver {} is not registered or inactive", input.driver_id),
            ));
        }
        if !self.catalog.vehicle_exists(input.vehicle_id).await? {
            return Err(validation_error(
                "vehicle_id",
                format!("vehicle {} is not registered or inactive", input.vehicle_id),
            ));
        }

        let notes = input
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(NewCheckoutSheet {
            company_id: input.company_id,
            platform,
            driver_id: input.driver_id,
            vehicle_id: input.vehicle_id,
            plate,
            odometer: input.odometer,
            fuel_percentage: input.fuel_percentage,
            notes,
        })
    }
}
