use async_trait::async_trait;

use crate::models::voucher::FuelVoucher;
use crate::repositories::PgStore;
use crate::utils::errors::AppResult;

/// Lectura del libro de vouchers (tabla administrada por otro módulo)
#[async_trait]
pub trait VoucherLedger: Send + Sync {
    async fn find_voucher(&self, voucher_id: i64) -> AppResult<Option<FuelVoucher>>;

    async fn available_vouchers(&self, limit: i64) -> AppResult<Vec<FuelVoucher>>;
}

#[async_trait]
impl VoucherLedger for PgStore {
    async fn find_voucher(&self, voucher_id: i64) -> AppResult<Option<FuelVoucher>> {
        let voucher = sqlx::query_as::<_, FuelVoucher>("SELECT * FROM fuel_vouchers WHERE id = $1")
            .bind(voucher_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(voucher)
    }

    async fn available_vouchers(&self, limit: i64) -> AppResult<Vec<FuelVoucher>> {
        let vouchers = sqlx::query_as::<_, FuelVoucher>(
            r#"
            SELECT v.* FROM fuel_vouchers v
            WHERE v.state = 'AVAILABLE'
              AND NOT EXISTS (SELECT 1 FROM checkout_sheets s WHERE s.bound_voucher_id = v.id)
            ORDER BY v.id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(vouchers)
    }
}
