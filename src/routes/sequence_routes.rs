use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::dto::sequence_dto::{InitializeSequenceRequest, SequenceResponse};
use crate::dto::ApiResponse;
use crate::state::AppState;
use crate::utils::errors::AppResult;
use crate::utils::extractors::{AppJson, AppPath};

/// Rutas de administración de contadores de documentos
pub fn sequence_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/companies/:company_id/sequences",
            post(initialize_sequence),
        )
        .route(
            "/api/companies/:company_id/sequences/:doc_type/next",
            post(allocate_next),
        )
}

async fn initialize_sequence(
    State(state): State<AppState>,
    AppPath(company_id): AppPath<i64>,
    AppJson(request): AppJson<InitializeSequenceRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SequenceResponse>>)> {
    let doc_type = request.doc_type().to_string();
    let start_at = request.start_at.unwrap_or_default();
    state.sequences.initialize(company_id, &doc_type, start_at).await?;

    let message = format!("Contador {} listo para la empresa {}", doc_type, company_id);
    let response = SequenceResponse {
        company_id,
        doc_type,
        start_at: Some(start_at),
        value: None,
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(response, message)),
    ))
}

async fn allocate_next(
    State(state): State<AppState>,
    AppPath((company_id, doc_type)): AppPath<(i64, String)>,
) -> AppResult<Json<ApiResponse<SequenceResponse>>> {
    let value = state.sequences.allocate(company_id, &doc_type).await?;
    Ok(Json(ApiResponse::success(SequenceResponse {
        company_id,
        doc_type,
        start_at: None,
        value: Some(value),
    })))
}
