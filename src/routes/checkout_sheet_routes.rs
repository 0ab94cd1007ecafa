use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::dto::checkout_sheet_dto::{AddAnnotationRequest, CreateCheckoutSheetRequest, ListSheetsQuery};
use crate::dto::ApiResponse;
use crate::models::annotation::ChecklistAnnotation;
use crate::models::checkout_sheet::{CheckoutSheet, SheetKey};
use crate::state::AppState;
use crate::utils::errors::AppResult;
use crate::utils::extractors::{AppJson, AppPath, AppQuery};

pub fn create_checkout_sheet_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/companies/:company_id/checkout-sheets",
            get(list_sheets).post(create_sheet),
        )
        .route(
            "/api/companies/:company_id/checkout-sheets/:sheet_id",
            get(get_sheet),
        )
        .route(
            "/api/companies/:company_id/checkout-sheets/:sheet_id/annotations",
            get(list_annotations).post(add_annotation),
        )
}

async fn create_sheet(
    State(state): State<AppState>,
    AppPath(company_id): AppPath<i64>,
    AppJson(request): AppJson<CreateCheckoutSheetRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CheckoutSheet>>)> {
    let sheet = state.sheets.create(request.into_input(company_id)).await?;
    let message = format!("Hoja de salida {} creada", sheet.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(sheet, message)),
    ))
}

async fn list_sheets(
    State(state): State<AppState>,
    AppPath(company_id): AppPath<i64>,
    AppQuery(query): AppQuery<ListSheetsQuery>,
) -> AppResult<Json<ApiResponse<Vec<CheckoutSheet>>>> {
    let sheets = state.sheets.list(query.into_filters(company_id)?).await?;
    Ok(Json(ApiResponse::success(sheets)))
}

async fn get_sheet(
    State(state): State<AppState>,
    AppPath((company_id, sheet_id)): AppPath<(i64, i64)>,
) -> AppResult<Json<ApiResponse<CheckoutSheet>>> {
    let sheet = state.sheets.get(SheetKey::new(company_id, sheet_id)).await?;
    Ok(Json(ApiResponse::success(sheet)))
}

async fn add_annotation(
    State(state): State<AppState>,
    AppPath((company_id, sheet_id)): AppPath<(i64, i64)>,
    AppJson(request): AppJson<AddAnnotationRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ChecklistAnnotation>>)> {
    let annotation = state
        .annotations
        .add_annotation(SheetKey::new(company_id, sheet_id), request.check_item_id, &request.text)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(annotation))))
}

async fn list_annotations(
    State(state): State<AppState>,
    AppPath((company_id, sheet_id)): AppPath<(i64, i64)>,
) -> AppResult<Json<ApiResponse<Vec<ChecklistAnnotation>>>> {
    let annotations = state
        .annotations
        .list_by_sheet(SheetKey::new(company_id, sheet_id))
        .await?;
    Ok(Json(ApiResponse::success(annotations)))
}
