//! Precondiciones de autorización
//!
//! Reglas puras evaluadas por cada backend dentro de su transacción, en
//! este orden: estado de la hoja, evidencia completa, voucher disponible.
//! La primera que falla determina el error.

use serde::Serialize;

use crate::models::checkout_sheet::{CheckoutSheet, SheetKey, SheetState};
use crate::models::photo::{RequiredCategories, VehiclePhotoCategory};
use crate::models::voucher::FuelVoucher;
use crate::utils::errors::{AppError, AppResult};

/// 1. La hoja debe existir y estar OPEN; una hoja inexistente tampoco
/// está en un estado autorizable
pub fn ensure_sheet_open(key: SheetKey, sheet: Option<&CheckoutSheet>) -> AppResult<()> {
    let sheet = sheet.ok_or_else(|| {
        AppError::InvalidState(format!(
            "checkout sheet {} does not exist and cannot be authorized",
            key
        ))
    })?;
    if sheet.state.is_terminal() {
        return Err(AppError::InvalidState(format!(
            "checkout sheet {} is {} and cannot be authorized",
            sheet.key(),
            sheet.state
        )));
    }
    Ok(())
}

/// 2. Todas las categorías exigidas deben tener al menos una foto
pub fn ensure_evidence_complete(
    required: &RequiredCategories,
    present: &[VehiclePhotoCategory],
) -> AppResult<()> {
    let missing = required.missing_from(present);
    if !missing.is_empty() {
        return Err(AppError::IncompleteEvidence { missing });
    }
    Ok(())
}

/// 3. El voucher debe existir, estar AVAILABLE y no estar ligado a otra hoja
pub fn ensure_voucher_available(
    voucher_id: i64,
    voucher: Option<&FuelVoucher>,
    bound_to_sheet: bool,
) -> AppResult<()> {
    if voucher_id <= 0 {
        return Err(AppError::VoucherUnavailable(format!(
            "voucher id {} is not valid",
            voucher_id
        )));
    }
    let voucher = voucher.ok_or_else(|| {
        AppError::VoucherUnavailable(format!("voucher {} does not exist", voucher_id))
    })?;
    if !voucher.is_available() {
        return Err(AppError::VoucherUnavailable(format!(
            "voucher {} is {}",
            voucher_id, voucher.state
        )));
    }
    if bound_to_sheet {
        return Err(AppError::VoucherUnavailable(format!(
            "voucher {} is already bound to another checkout sheet",
            voucher_id
        )));
    }
    Ok(())
}

/// Vista previa de si una hoja puede autorizarse (sin mirar el voucher)
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationReadiness {
    pub company_id: i64,
    pub sheet_id: i64,
    pub state: SheetState,
    pub missing_categories: Vec<VehiclePhotoCategory>,
    pub ready: bool,
}

impl AuthorizationReadiness {
    pub fn evaluate(
        sheet: &CheckoutSheet,
        required: &RequiredCategories,
        present: &[VehiclePhotoCategory],
    ) -> Self {
        let missing_categories = required.missing_from(present);
        Self {
            company_id: sheet.company_id,
            sheet_id: sheet.id,
            state: sheet.state,
            ready: sheet.is_open() && missing_categories.is_empty(),
            missing_categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::checkout_sheet::{NewCheckoutSheet, Platform};
    use crate::models::voucher::VoucherState;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn open_sheet() -> CheckoutSheet {
        NewCheckoutSheet {
            company_id: 1,
            platform: Platform::Didi,
            driver_id: 4,
            vehicle_id: 1,
            plate: "ABC1234".to_string(),
            odometer: 10,
            fuel_percentage: 80,
            notes: None,
        }
        .into_sheet(3, Utc::now())
    }

    fn voucher(state: VoucherState) -> FuelVoucher {
        FuelVoucher {
            id: 7,
            provider: "Primax".to_string(),
            value: Decimal::new(5000, 2),
            coupon: "CUP-7".to_string(),
            state,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_terminal_sheet_is_rejected() {
        let mut sheet = open_sheet();
        let key = sheet.key();
        assert!(ensure_sheet_open(key, Some(&sheet)).is_ok());
        sheet.state = SheetState::Cancelled;
        assert!(matches!(
            ensure_sheet_open(key, Some(&sheet)),
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(ensure_sheet_open(key, None), Err(AppError::InvalidState(_))));
    }

    #[test]
    fn test_incomplete_evidence_lists_missing() {
        let err = ensure_evidence_complete(
            &RequiredCategories::default(),
            &[VehiclePhotoCategory::Front, VehiclePhotoCategory::Rear],
        )
        .unwrap_err();
        match err {
            AppError::IncompleteEvidence { missing } => assert_eq!(
                missing,
                vec![
                    VehiclePhotoCategory::Left,
                    VehiclePhotoCategory::Right,
                    VehiclePhotoCategory::Odometer
                ]
            ),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_voucher_rules() {
        assert!(ensure_voucher_available(7, Some(&voucher(VoucherState::Available)), false).is_ok());
        assert!(matches!(
            ensure_voucher_available(7, None, false),
            Err(AppError::VoucherUnavailable(_))
        ));
        assert!(matches!(
            ensure_voucher_available(7, Some(&voucher(VoucherState::Bound)), false),
            Err(AppError::VoucherUnavailable(_))
        ));
        assert!(matches!(
            ensure_voucher_available(7, Some(&voucher(VoucherState::Available)), true),
            Err(AppError::VoucherUnavailable(_))
        ));
        assert!(matches!(
            ensure_voucher_available(0, None, false),
            Err(AppError::VoucherUnavailable(_))
        ));
    }

    #[test]
    fn test_readiness() {
        let sheet = open_sheet();
        let ready = AuthorizationReadiness::evaluate(
            &sheet,
            &RequiredCategories::default(),
            &VehiclePhotoCategory::ALL,
        );
        assert!(ready.ready);

        let not_ready = AuthorizationReadiness::evaluate(&sheet, &RequiredCategories::default(), &[]);
        assert!(!not_ready.ready);
        assert_eq!(not_ready.missing_categories.len(), 5);
    }
}
