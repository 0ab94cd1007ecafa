use async_trait::async_trait;

use crate::repositories::PgStore;
use crate::utils::errors::AppResult;

/// Catálogos externos (conductores, vehículos, ítems del checklist)
#[async_trait]
pub trait FleetCatalog: Send + Sync {
    async fn driver_exists(&self, driver_id: i64) -> AppResult<bool>;

    async fn vehicle_exists(&self, vehicle_id: i64) -> AppResult<bool>;

    async fn check_item_exists(&self, check_item_id: i64) -> AppResult<bool>;
}

#[async_trait]
impl FleetCatalog for PgStore {
    async fn driver_exists(&self, driver_id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM drivers WHERE id = $1 AND active)")
                .bind(driver_id)
                .fetch_one(self.pool())
                .await?;

        Ok(exists)
    }

    async fn vehicle_exists(&self, vehicle_id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM vehicles WHERE id = $1 AND active)")
                .bind(vehicle_id)
                .fetch_one(self.pool())
                .await?;

        Ok(exists)
    }

    async fn check_item_exists(&self, check_item_id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM check_items WHERE id = $1 AND active)")
                .bind(check_item_id)
                .fetch_one(self.pool())
                .await?;

        Ok(exists)
    }
}
