use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::dto::evidence_dto::{EvidenceReviewResponse, ItemPhotoUploadRequest, VehiclePhotoSetRequest};
use crate::dto::ApiResponse;
use crate::models::checkout_sheet::SheetKey;
use crate::models::photo::{ItemPhoto, VehiclePhoto};
use crate::state::AppState;
use crate::utils::errors::AppResult;
use crate::utils::extractors::{AppJson, AppPath};

pub fn create_evidence_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/companies/:company_id/checkout-sheets/:sheet_id/vehicle-photos",
            get(list_vehicle_photos).post(upload_vehicle_photos),
        )
        .route(
            "/api/companies/:company_id/checkout-sheets/:sheet_id/item-photos",
            get(list_item_photos).post(upload_item_photo),
        )
        .route(
            "/api/companies/:company_id/checkout-sheets/:sheet_id/evidence",
            get(evidence_review),
        )
        .route("/api/photos/:photo_id", get(photo_bytes))
}

async fn upload_vehicle_photos(
    State(state): State<AppState>,
    AppPath((company_id, sheet_id)): AppPath<(i64, i64)>,
    AppJson(request): AppJson<VehiclePhotoSetRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Vec<VehiclePhoto>>>)> {
    let uploads = request.into_uploads()?;
    let photos = state
        .evidence
        .upload_vehicle_photo_set(SheetKey::new(company_id, sheet_id), uploads)
        .await?;
    let message = format!("{} foto(s) de vehículo guardadas", photos.len());
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(photos, message)),
    ))
}

async fn list_vehicle_photos(
    State(state): State<AppState>,
    AppPath((company_id, sheet_id)): AppPath<(i64, i64)>,
) -> AppResult<Json<ApiResponse<Vec<VehiclePhoto>>>> {
    let photos = state
        .evidence
        .get_vehicle_photos_for_sheet(SheetKey::new(company_id, sheet_id))
        .await?;
    Ok(Json(ApiResponse::success(photos)))
}

async fn upload_item_photo(
    State(state): State<AppState>,
    AppPath((company_id, sheet_id)): AppPath<(i64, i64)>,
    AppJson(request): AppJson<ItemPhotoUploadRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ItemPhoto>>)> {
    let (bytes, meta) = request.photo.decode()?;
    let photo = state
        .evidence
        .upload_item_photo(SheetKey::new(company_id, sheet_id), request.check_item_id, bytes, meta)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(photo))))
}

async fn list_item_photos(
    State(state): State<AppState>,
    AppPath((company_id, sheet_id)): AppPath<(i64, i64)>,
) -> AppResult<Json<ApiResponse<Vec<ItemPhoto>>>> {
    let photos = state
        .evidence
        .get_item_photos_for_sheet(SheetKey::new(company_id, sheet_id))
        .await?;
    Ok(Json(ApiResponse::success(photos)))
}

async fn evidence_review(
    State(state): State<AppState>,
    AppPath((company_id, sheet_id)): AppPath<(i64, i64)>,
) -> AppResult<Json<ApiResponse<EvidenceReviewResponse>>> {
    let review = state
        .evidence
        .evidence_review(SheetKey::new(company_id, sheet_id))
        .await?;
    Ok(Json(ApiResponse::success(review.into())))
}

/// Bytes crudos con el Content-Type guardado, sin envoltorio JSON
async fn photo_bytes(
    State(state): State<AppState>,
    AppPath(photo_id): AppPath<Uuid>,
) -> AppResult<Response> {
    let photo = state.evidence.fetch_photo_bytes(photo_id).await?;

    let content_type = HeaderValue::from_str(&photo.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!("inline; filename=\"{}\"", photo.filename))
        .unwrap_or_else(|_| HeaderValue::from_static("inline"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, HeaderValue::from_static("private, max-age=3600")),
        ],
        photo.content,
    )
        .into_response())
}
