//! Compuerta de autorización
//!
//! Única transición OPEN -> AUTHORIZED (ligando un voucher) u
//! OPEN -> CANCELLED. Las precondiciones se evalúan dentro de la
//! transacción del backend; aquí no se reintenta nada que escriba.

use chrono::Utc;
use std::sync::Arc;

use crate::models::authorization::AuthorizationReadiness;
use crate::models::checkout_sheet::{
    CheckoutSheet, Platform, SheetFilters, SheetKey, SheetOrder, SheetState,
};
use crate::models::voucher::FuelVoucher;
use crate::repositories::{AuthorizationRepository, CheckoutSheetRepository, VoucherLedger};
use crate::services::evidence_store::EvidenceStore;
use crate::utils::errors::AppResult;
use crate::utils::retry::retry_read;

pub const DEFAULT_VOUCHER_LIMIT: i64 = 50;
pub const MAX_VOUCHER_LIMIT: i64 = 200;

/// Filtros del listado de hojas pendientes (siempre estado OPEN)
#[derive(Debug, Clone, Default)]
pub struct PendingFilters {
    pub company_id: Option<i64>,
    pub platform: Option<Platform>,
    pub plate: Option<String>,
    pub driver_name: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl From<PendingFilters> for SheetFilters {
    fn from(filters: PendingFilters) -> Self {
        SheetFilters {
            company_id: filters.company_id,
            id: None,
            platform: filters.platform,
            plate: filters.plate,
            driver_name: filters.driver_name,
            state: Some(SheetState::Open),
            order: SheetOrder::OldestFirst,
            limit: filters.limit,
            offset: filters.offset,
        }
    }
}

#[derive(Clone)]
pub struct AuthorizationGate {
    transitions: Arc<dyn AuthorizationRepository>,
    sheets: Arc<dyn CheckoutSheetRepository>,
    vouchers: Arc<dyn VoucherLedger>,
    evidence: EvidenceStore,
    read_attempts: u32,
}

impl AuthorizationGate {
    pub fn new(
        transitions: Arc<dyn AuthorizationRepository>,
        sheets: Arc<dyn CheckoutSheetRepository>,
        vouchers: Arc<dyn VoucherLedger>,
        evidence: EvidenceStore,
        read_attempts: u32,
    ) -> Self {
        Self {
            transitions,
            sheets,
            vouchers,
            evidence,
            read_attempts,
        }
    }

    /// Autorizar la hoja con un voucher. Orden de precondiciones:
    /// hoja OPEN, evidencia completa, voucher disponible.
    pub async fn authorize(&self, key: SheetKey, voucher_id: i64) -> AppResult<CheckoutSheet> {
        let result = self
            .transitions
            .authorize(key, voucher_id, self.evidence.required_categories(), Utc::now())
            .await;

        match &result {
            Ok(sheet) => log::info!("✅ Hoja {} autorizada con voucher {}", sheet.key(), voucher_id),
            Err(e) => log::warn!("⛔ Autorización de hoja {} rechazada: {}", key, e),
        }
        result
    }

    pub async fn cancel(&self, key: SheetKey) -> AppResult<CheckoutSheet> {
        let sheet = self.transitions.cancel(key, Utc::now()).await?;
        log::info!("🚫 Hoja {} cancelada", key);
        Ok(sheet)
    }

    /// Hojas OPEN en una sola consulta, de la más antigua a la más nueva
    pub async fn list_pending(&self, filters: PendingFilters) -> AppResult<Vec<CheckoutSheet>> {
        let filters = SheetFilters::from(filters).normalized();
        retry_read(self.read_attempts, "list_pending_sheets", || {
            self.sheets.list(&filters)
        })
        .await
    }

    /// Si authorize pasaría las dos primeras precondiciones ahora mismo
    pub async fn readiness(&self, key: SheetKey) -> AppResult<AuthorizationReadiness> {
        let review = self.evidence.evidence_review(key).await?;
        let present: Vec<_> = review.vehicle_photos.iter().map(|p| p.category).collect();
        Ok(AuthorizationReadiness::evaluate(
            &review.sheet,
            self.evidence.required_categories(),
            &present,
        ))
    }

    pub async fn available_vouchers(&self, limit: Option<i64>) -> AppResult<Vec<FuelVoucher>> {
        let limit = match limit {
            Some(l) if l > 0 => l.min(MAX_VOUCHER_LIMIT),
            _ => DEFAULT_VOUCHER_LIMIT,
        };
        retry_read(self.read_attempts, "available_vouchers", || {
            self.vouchers.available_vouchers(limit)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::checkout_sheet::{NewCheckoutSheet, CHECKOUT_SHEET_DOC_TYPE};
    use crate::models::photo::{PhotoMeta, VehiclePhotoCategory};
    use crate::models::voucher::VoucherState;
    use crate::repositories::{InMemoryStore, SequenceRepository};
    use crate::services::ServiceSettings;
    use crate::utils::errors::AppError;
    use rust_decimal::Decimal;

    use crate::utils::image::fixtures::png;

    async fn setup() -> (Arc<InMemoryStore>, AuthorizationGate, SheetKey) {
        let store = Arc::new(InMemoryStore::new());
        store.add_voucher(7, "Primax", Decimal::new(5000, 2), "CUP-7").await;
        store.add_voucher(8, "Repsol", Decimal::new(3000, 2), "CUP-8").await;
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
            store.clone(),
            ServiceSettings::default(),
        );
        let gate = AuthorizationGate::new(store.clone(), store.clone(), store.clone(), evidence, 1);
        (store, gate, sheet.key())
    }

    async fn upload_all(gate: &AuthorizationGate, key: SheetKey) {
        for category in VehiclePhotoCategory::ALL {
            gate.evidence
                .upload_vehicle_photo(key, category, png(category as u8), PhotoMeta::default())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_authorize_requires_complete_evidence() {
        let (store, gate, key) = setup().await;

        let err = gate.authorize(key, 7).await.unwrap_err();
        assert!(matches!(err, AppError::IncompleteEvidence { ref missing } if missing.len() == 5));

        let voucher = store.find_voucher(7).await.unwrap().unwrap();
        assert_eq!(voucher.state, VoucherState::Available);
        assert!(gate.readiness(key).await.unwrap().missing_categories.len() == 5);
    }

    #[tokio::test]
    async fn test_authorize_binds_voucher_once() {
        let (store, gate, key) = setup().await;
        upload_all(&gate, key).await;
        assert!(gate.readiness(key).await.unwrap().ready);

        let sheet = gate.authorize(key, 7).await.unwrap();
        assert_eq!(sheet.state, SheetState::Authorized);
        assert_eq!(sheet.bound_voucher_id, Some(7));
        assert!(sheet.authorized_at.is_some());
        assert_eq!(
            store.find_voucher(7).await.unwrap().unwrap().state,
            VoucherState::Bound
        );

        assert!(matches!(gate.authorize(key, 8).await, Err(AppError::InvalidState(_))));
        assert!(matches!(gate.cancel(key).await, Err(AppError::InvalidState(_))));
        assert!(!gate.readiness(key).await.unwrap().ready);
    }

    #[tokio::test]
    async fn test_authorize_rejects_unavailable_voucher() {
        let (_, gate, key) = setup().await;
        upload_all(&gate, key).await;

        assert!(matches!(
            gate.authorize(key, 999).await,
            Err(AppError::VoucherUnavailable(_))
        ));
        assert!(matches!(
            gate.authorize(key, 0).await,
            Err(AppError::VoucherUnavailable(_))
        ));
        assert!(matches!(
            gate.authorize(SheetKey::new(1, 50), 7).await,
            Err(AppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_sheet_state_is_checked_before_voucher() {
        let (store, gate, key) = setup().await;
        gate.cancel(key).await.unwrap();

        assert!(matches!(gate.authorize(key, 0).await, Err(AppError::InvalidState(_))));
        assert!(matches!(gate.authorize(key, -3).await, Err(AppError::InvalidState(_))));
        assert!(matches!(gate.authorize(key, 7).await, Err(AppError::InvalidState(_))));
        assert_eq!(
            store.find_voucher(7).await.unwrap().unwrap().state,
            VoucherState::Available
        );
    }

    #[tokio::test]
    async fn test_pending_and_vouchers() {
        let (_, gate, key) = setup().await;

        let pending = gate.list_pending(PendingFilters::default()).await.unwrap();
        assert_eq!(pending.len(), 1);

        upload_all(&gate, key).await;
        gate.authorize(key, 7).await.unwrap();

        assert!(gate.list_pending(PendingFilters::default()).await.unwrap().is_empty());
        let vouchers = gate.available_vouchers(None).await.unwrap();
        assert_eq!(vouchers.iter().map(|v| v.id).collect::<Vec<_>>(), vec![8]);
    }
}
