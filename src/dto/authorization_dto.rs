use serde::Deserialize;

use crate::dto::checkout_sheet_dto::parse_optional;
use crate::models::checkout_sheet::Platform;
use crate::services::authorization_gate::PendingFilters;
use crate::utils::errors::AppResult;

// Request para autorizar una hoja contra un voucher
#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub voucher_id: i64,
}

// Query del listado de pendientes (todas las empresas si no se filtra)
#[derive(Debug, Default, Deserialize)]
pub struct PendingQuery {
    pub company_id: Option<i64>,
    pub platform: Option<String>,
    pub plate: Option<String>,
    pub driver_name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PendingQuery {
    pub fn into_filters(self) -> AppResult<PendingFilters> {
        Ok(PendingFilters {
            company_id: self.company_id,
            platform: parse_optional(self.platform, Platform::parse)?,
            plate: self.plate,
            driver_name: self.driver_name,
            limit: self.limit.unwrap_or_default(),
            offset: self.offset.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VoucherQuery {
    pub limit: Option<i64>,
}
