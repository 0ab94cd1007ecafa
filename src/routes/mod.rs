//! Router HTTP
//!
//! Cada archivo registra rutas completas y aquí se combinan con `merge`,
//! junto con las capas de límite de body, timeout, compresión, trazas y CORS.

pub mod authorization_routes;
pub mod checkout_sheet_routes;
pub mod evidence_routes;
pub mod sequence_routes;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::middleware::cors::cors_layer;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/health", get(health))
        .merge(checkout_sheet_routes::create_checkout_sheet_router())
        .merge(evidence_routes::create_evidence_router())
        .merge(authorization_routes::authorization_routes())
        .merge(sequence_routes::sequence_routes())
        .layer(DefaultBodyLimit::max(config.request_body_limit()))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
        .with_state(state)
}

/// Endpoint de salud: el servicio responde y el backend acepta consultas
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (status, database) = match state.store_health.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!("❌ Health check de base de datos falló: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        status,
        Json(json!({
            "status": if status == StatusCode::OK { "ok" } else { "degraded" },
            "service": "fleet_checkout",
            "database": database,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
