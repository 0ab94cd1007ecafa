use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::dto::authorization_dto::{AuthorizeRequest, PendingQuery, VoucherQuery};
use crate::dto::ApiResponse;
use crate::models::authorization::AuthorizationReadiness;
use crate::models::checkout_sheet::{CheckoutSheet, SheetKey};
use crate::models::voucher::FuelVoucher;
use crate::state::AppState;
use crate::utils::errors::AppResult;
use crate::utils::extractors::{AppJson, AppPath, AppQuery};

/// Configura las rutas de autorización
pub fn authorization_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/companies/:company_id/checkout-sheets/:sheet_id/readiness",
            get(readiness),
        )
        .route(
            "/api/companies/:company_id/checkout-sheets/:sheet_id/authorize",
            post(authorize),
        )
        .route(
            "/api/companies/:company_id/checkout-sheets/:sheet_id/cancel",
            post(cancel),
        )
        .route("/api/checkout-sheets/pending", get(list_pending))
        .route("/api/vouchers/available", get(available_vouchers))
}

async fn readiness(
    State(state): State<AppState>,
    AppPath((company_id, sheet_id)): AppPath<(i64, i64)>,
) -> AppResult<Json<ApiResponse<AuthorizationReadiness>>> {
    let readiness = state.gate.readiness(SheetKey::new(company_id, sheet_id)).await?;
    Ok(Json(ApiResponse::success(readiness)))
}

async fn authorize(
    State(state): State<AppState>,
    AppPath((company_id, sheet_id)): AppPath<(i64, i64)>,
    AppJson(request): AppJson<AuthorizeRequest>,
) -> AppResult<Json<ApiResponse<CheckoutSheet>>> {
    let sheet = state
        .gate
        .authorize(SheetKey::new(company_id, sheet_id), request.voucher_id)
        .await?;
    let message = format!("Hoja {} autorizada con voucher {}", sheet.id, request.voucher_id);
    Ok(Json(ApiResponse::success_with_message(sheet, message)))
}

async fn cancel(
    State(state): State<AppState>,
    AppPath((company_id, sheet_id)): AppPath<(i64, i64)>,
) -> AppResult<Json<ApiResponse<CheckoutSheet>>> {
    let sheet = state.gate.cancel(SheetKey::new(company_id, sheet_id)).await?;
    Ok(Json(ApiResponse::success(sheet)))
}

async fn list_pending(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PendingQuery>,
) -> AppResult<Json<ApiResponse<Vec<CheckoutSheet>>>> {
    let sheets = state.gate.list_pending(query.into_filters()?).await?;
    Ok(Json(ApiResponse::success(sheets)))
}

async fn available_vouchers(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<VoucherQuery>,
) -> AppResult<Json<ApiResponse<Vec<FuelVoucher>>>> {
    let vouchers = state.gate.available_vouchers(query.limit).await?;
    Ok(Json(ApiResponse::success(vouchers)))
}
