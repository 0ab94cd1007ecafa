use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::authorization::{
    ensure_evidence_complete, ensure_sheet_open, ensure_voucher_available,
};
use crate::models::checkout_sheet::{CheckoutSheet, SheetKey, SheetState};
use crate::models::photo::RequiredCategories;
use crate::models::voucher::FuelVoucher;
use crate::repositories::checkout_sheet_repository::{sheet_not_found, sheet_not_open};
use crate::repositories::photo_repository::present_categories_in;
use crate::repositories::PgStore;
use crate::utils::errors::{AppError, AppResult};

/// Transiciones de estado de la hoja (OPEN -> AUTHORIZED | CANCELLED)
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Verificar precondiciones y aplicar el efecto en una única transacción:
    /// voucher BOUND + hoja AUTHORIZED, o nada.
    async fn authorize(
        &self,
        key: SheetKey,
        voucher_id: i64,
        required: &RequiredCategories,
        now: DateTime<Utc>,
    ) -> AppResult<CheckoutSheet>;

    /// Compare-and-swap OPEN -> CANCELLED; los hijos no se tocan
    async fn cancel(&self, key: SheetKey, now: DateTime<Utc>) -> AppResult<CheckoutSheet>;
}

#[async_trait]
impl AuthorizationRepository for PgStore {
    async fn authorize(
        &self,
        key: SheetKey,
        voucher_id: i64,
        required: &RequiredCategories,
        now: DateTime<Utc>,
    ) -> AppResult<CheckoutSheet> {
        let mut tx = self.pool().begin().await?;

        // Orden de locks: hoja, luego voucher
        let sheet = sqlx::query_as::<_, CheckoutSheet>(
            "SELECT * FROM checkout_sheets WHERE company_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(key.company_id)
        .bind(key.sheet_id)
        .fetch_optional(&mut *tx)
        .await?;
        ensure_sheet_open(key, sheet.as_ref())?;

        let present = present_categories_in(&mut tx, key).await?;
        ensure_evidence_complete(required, &present)?;

        let voucher = sqlx::query_as::<_, FuelVoucher>(
            "SELECT * FROM fuel_vouchers WHERE id = $1 FOR UPDATE",
        )
        .bind(voucher_id)
        .fetch_optional(&mut *tx)
        .await?;
        let bound_to_sheet: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM checkout_sheets WHERE bound_voucher_id = $1)",
        )
        .bind(voucher_id)
        .fetch_one(&mut *tx)
        .await?;
        ensure_voucher_available(voucher_id, voucher.as_ref(), bound_to_sheet)?;

        let bound = sqlx::query(
            r#"
            UPDATE fuel_vouchers SET state = 'BOUND', updated_at = $2
            WHERE id = $1 AND state = 'AVAILABLE'
            "#,
        )
        .bind(voucher_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if bound.rows_affected() != 1 {
            return Err(AppError::VoucherUnavailable(format!(
                "voucher {} could not be bound",
                voucher_id
            )));
        }

        let authorized = sqlx::query_as::<_, CheckoutSheet>(
            r#"
            UPDATE checkout_sheets
            SET state = 'AUTHORIZED', bound_voucher_id = $3, authorized_at = $4, updated_at = $4
            WHERE company_id = $1 AND id = $2 AND state = 'OPEN'
            RETURNING *
            "#,
        )
        .bind(key.company_id)
        .bind(key.sheet_id)
        .bind(voucher_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::InvalidState(format!(
                "checkout sheet {} changed state during authorization",
                key
            ))
        })?;

        tx.commit().await?;
        Ok(authorized)
    }

    async fn cancel(&self, key: SheetKey, now: DateTime<Utc>) -> AppResult<CheckoutSheet> {
        let cancelled = sqlx::query_as::<_, CheckoutSheet>(
            r#"
            UPDATE checkout_sheets
            SET state = 'CANCELLED', cancelled_at = $3, updated_at = $3
            WHERE company_id = $1 AND id = $2 AND state = 'OPEN'
            RETURNING *
            "#,
        )
        .bind(key.company_id)
        .bind(key.sheet_id)
        .bind(now)
        .fetch_optional(self.pool())
        .await?;

        if let Some(sheet) = cancelled {
            return Ok(sheet);
        }

        // El CAS no aplicó: distinguir hoja inexistente de estado terminal
        let state: Option<String> = sqlx::query_scalar(
            "SELECT state FROM checkout_sheets WHERE company_id = $1 AND id = $2",
        )
        .bind(key.company_id)
        .bind(key.sheet_id)
        .fetch_optional(self.pool())
        .await?;

        match state {
            None => Err(sheet_not_found(key)),
            Some(state) => {
                let state = SheetState::parse(&state).map_err(|e| AppError::Storage(e.to_string()))?;
                Err(sheet_not_open(key, state))
            }
        }
    }
}
