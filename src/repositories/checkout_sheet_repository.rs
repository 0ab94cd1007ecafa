use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::models::checkout_sheet::{
    CheckoutSheet, NewCheckoutSheet, SheetFilters, SheetKey, SheetOrder, SheetState,
};
use crate::repositories::sequence_repository::next_sequence_value;
use crate::repositories::PgStore;
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[async_trait]
pub trait CheckoutSheetRepository: Send + Sync {
    /// Asignar el id y persistir la cabecera en la misma transacción
    async fn create(
        &self,
        doc_type: &str,
        sheet: &NewCheckoutSheet,
        now: DateTime<Utc>,
    ) -> AppResult<CheckoutSheet>;

    async fn find(&self, key: SheetKey) -> AppResult<Option<CheckoutSheet>>;

    async fn list(&self, filters: &SheetFilters) -> AppResult<Vec<CheckoutSheet>>;
}

pub(crate) fn sheet_not_found(key: SheetKey) -> AppError {
    not_found_error("Checkout sheet", key)
}

pub(crate) fn sheet_not_open(key: SheetKey, state: SheetState) -> AppError {
    AppError::InvalidState(format!(
        "checkout sheet {} is {} and no longer accepts changes",
        key, state
    ))
}

/// Bloquear la hoja en modo compartido y exigir que siga OPEN.
/// Las escrituras de hijos se serializan contra authorize/cancel
/// (FOR UPDATE) pero no entre sí.
pub(crate) async fn lock_open_sheet(conn: &mut PgConnection, key: SheetKey) -> AppResult<()> {
    let state: Option<String> = sqlx::query_scalar(
        "SELECT state FROM checkout_sheets WHERE company_id = $1 AND id = $2 FOR SHARE",
    )
    .bind(key.company_id)
    .bind(key.sheet_id)
    .fetch_optional(&mut *conn)
    .await?;

    let state = state.ok_or_else(|| sheet_not_found(key))?;
    let state = SheetState::parse(&state).map_err(|e| AppError::Storage(e.to_string()))?;
    if state.is_terminal() {
        return Err(sheet_not_open(key, state));
    }
    Ok(())
}

/// Los filtros de texto son subcadenas literales: `%` y `_` no son comodines
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

const LIST_SHEETS_NEWEST_FIRST: &str = r#"
    SELECT s.* FROM checkout_sheets s
    LEFT JOIN drivers d ON d.id = s.driver_id
    WHERE ($1::BIGINT IS NULL OR s.company_id = $1)
      AND ($2::BIGINT IS NULL OR s.id = $2)
      AND ($3::TEXT IS NULL OR s.platform = $3)
      AND ($4::TEXT IS NULL OR s.plate ILIKE '%' || $4 || '%' ESCAPE '\')
      AND ($5::TEXT IS NULL OR d.full_name ILIKE '%' || $5 || '%' ESCAPE '\')
      AND ($6::TEXT IS NULL OR s.state = $6)
    ORDER BY s.created_at DESC, s.company_id DESC, s.id DESC
    LIMIT $7 OFFSET $8
"#;

const LIST_SHEETS_OLDEST_FIRST: &str = r#"
    SELECT s.* FROM checkout_sheets s
    LEFT JOIN drivers d ON d.id = s.driver_id
    WHERE ($1::BIGINT IS NULL OR s.company_id = $1)
      AND ($2::BIGINT IS NULL OR s.id = $2)
      AND ($3::TEXT IS NULL OR s.platform = $3)
      AND ($4::TEXT IS NULL OR s.plate ILIKE '%' || $4 || '%' ESCAPE '\')
      AND ($5::TEXT IS NULL OR d.full_name ILIKE '%' || $5 || '%' ESCAPE '\')
      AND ($6::TEXT IS NULL OR s.state = $6)
    ORDER BY s.created_at ASC, s.company_id ASC, s.id ASC
    LIMIT $7 OFFSET $8
"#;

#[async_trait]
impl CheckoutSheetRepository for PgStore {
    async fn create(
        &self,
        doc_type: &str,
        sheet: &NewCheckoutSheet,
        now: DateTime<Utc>,
    ) -> AppResult<CheckoutSheet> {
        let mut tx = self.pool().begin().await?;

        let id = next_sequence_value(&mut tx, sheet.company_id, doc_type).await?;

        let created = sqlx::query_as::<_, CheckoutSheet>(
            r#"
            INSERT INTO checkout_sheets (
                company_id, id, platform, driver_id, vehicle_id, plate, odometer,
                fuel_percentage, notes, state, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'OPEN', $10, $10)
            RETURNING *
            "#,
        )
        .bind(sheet.company_id)
        .bind(id)
        .bind(sheet.platform.as_str())
        .bind(sheet.driver_id)
        .bind(sheet.vehicle_id)
        .bind(&sheet.plate)
        .bind(sheet.odometer)
        .bind(sheet.fuel_percentage)
        .bind(&sheet.notes)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn find(&self, key: SheetKey) -> AppResult<Option<CheckoutSheet>> {
        let sheet = sqlx::query_as::<_, CheckoutSheet>(
            "SELECT * FROM checkout_sheets WHERE company_id = $1 AND id = $2",
        )
        .bind(key.company_id)
        .bind(key.sheet_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(sheet)
    }

    async fn list(&self, filters: &SheetFilters) -> AppResult<Vec<CheckoutSheet>> {
        let sql = match filters.order {
            SheetOrder::NewestFirst => LIST_SHEETS_NEWEST_FIRST,
            SheetOrder::OldestFirst => LIST_SHEETS_OLDEST_FIRST,
        };

        let sheets = sqlx::query_as::<_, CheckoutSheet>(sql)
            .bind(filters.company_id)
            .bind(filters.id)
            .bind(filters.platform.map(|p| p.as_str()))
            .bind(filters.plate.as_deref().map(escape_like))
            .bind(filters.driver_name.as_deref().map(escape_like))
            .bind(filters.state.map(|s| s.as_str()))
            .bind(filters.limit)
            .bind(filters.offset)
            .fetch_all(self.pool())
            .await?;

        Ok(sheets)
    }
}
