mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::*;
use fleet_checkout::config::EnvironmentConfig;
use fleet_checkout::create_router;

async fn create_test_app() -> Router {
    create_router(app_state(seeded_store().await))
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn sheet_body() -> Value {
    json!({
        "platform": "UBER",
        "driver_id": DRIVER_ID,
        "vehicle_id": VEHICLE_ID,
        "plate": "TEST123",
        "odometer": 1000,
        "fuel_percentage": 50
    })
}

fn photo_set_body() -> Value {
    let photos: Vec<Value> = ["front", "rear", "left", "right", "odometer"]
        .iter()
        .enumerate()
        .map(|(i, category)| {
            json!({
                "category": category,
                "filename": format!("{}.png", category),
                "mime_type": "image/png",
                "data": general_purpose::STANDARD.encode(png_bytes(i as u8)),
            })
        })
        .collect();
    json!({ "photos": photos })
}

async fn create_sheet(app: &Router) -> i64 {
    let response = send(app, post_json("/api/companies/1/checkout-sheets", sheet_body())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;
    let response = send(&app, get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_create_and_get_sheet() {
    let app = create_test_app().await;
    let id = create_sheet(&app).await;

    let response = send(&app, get(&format!("/api/companies/1/checkout-sheets/{}", id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["state"], "OPEN");
    assert_eq!(body["data"]["platform"], "UBER");
}

#[tokio::test]
async fn test_validation_error_is_structured() {
    let app = create_test_app().await;
    let mut body = sheet_body();
    body["fuel_percentage"] = json!(150);

    let response = send(&app, post_json("/api/companies/1/checkout-sheets", body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "VALIDATION_ERROR");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let app = create_test_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/companies/1/checkout-sheets")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["kind"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_missing_sheet_is_not_found() {
    let app = create_test_app().await;
    let response = send(&app, get("/api/companies/1/checkout-sheets/999")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["kind"], "NOT_FOUND");
}

#[tokio::test]
async fn test_authorize_flow_over_http() {
    let app = create_test_app().await;
    let id = create_sheet(&app).await;
    let base = format!("/api/companies/1/checkout-sheets/{}", id);

    let response = send(&app, post_json(&format!("{}/authorize", base), json!({ "voucher_id": 7 }))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["kind"], "INCOMPLETE_EVIDENCE");
    assert_eq!(body["details"]["missing_categories"].as_array().unwrap().len(), 5);

    let response = send(&app, post_json(&format!("{}/vehicle-photos", base), photo_set_body())).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(&app, get(&format!("{}/readiness", base))).await;
    assert_eq!(body_json(response).await["data"]["ready"], true);

    let response = send(&app, post_json(&format!("{}/authorize", base), json!({ "voucher_id": 7 }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["state"], "AUTHORIZED");
    assert_eq!(body["data"]["bound_voucher_id"], 7);

    let response = send(&app, post_json(&format!("{}/authorize", base), json!({ "voucher_id": 8 }))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["kind"], "INVALID_STATE");

    let response = send(&app, get("/api/vouchers/available")).await;
    let body = body_json(response).await;
    let ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![8]);
}

#[tokio::test]
async fn test_photo_bytes_are_served_raw() {
    let app = create_test_app().await;
    let id = create_sheet(&app).await;
    let original = jpeg_bytes();

    let response = send(
        &app,
        post_json(
            &format!("/api/companies/1/checkout-sheets/{}/item-photos", id),
            json!({
                "check_item_id": CHECK_ITEM_ID,
                "filename": "espejo.jpg",
                "data": format!("data:image/jpeg;base64,{}", general_purpose::STANDARD.encode(&original)),
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let photo_id = body_json(response).await["data"]["id"].as_str().unwrap().to_string();

    let response = send(&app, get(&format!("/api/photos/{}", photo_id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(body_bytes(response).await, original);
}

#[tokio::test]
async fn test_double_encoded_upload_is_rejected() {
    let app = create_test_app().await;
    let id = create_sheet(&app).await;

    // base64 de un string base64: los bytes decodificados no son una imagen
    let once = general_purpose::STANDARD.encode(jpeg_bytes());
    let twice = general_purpose::STANDARD.encode(once.as_bytes());
    let response = send(
        &app,
        post_json(
            &format!("/api/companies/1/checkout-sheets/{}/vehicle-photos", id),
            json!({ "photos": [{ "category": "front", "data": twice }] }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["kind"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_evidence_review_embeds_images() {
    let app = create_test_app().await;
    let id = create_sheet(&app).await;
    let base = format!("/api/companies/1/checkout-sheets/{}", id);

    send(&app, post_json(&format!("{}/annotations", base), json!({ "check_item_id": CHECK_ITEM_ID, "text": "mirrors OK" }))).await;
    send(&app, post_json(&format!("{}/vehicle-photos", base), photo_set_body())).await;

    let response = send(&app, get(&format!("{}/evidence", base))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let data = &body["data"];
    assert_eq!(data["complete"], true);
    assert_eq!(data["annotations"][0]["text"], "mirrors OK");

    let photos = data["vehicle_photos"].as_array().unwrap();
    assert_eq!(photos.len(), 5);
    let embedded = general_purpose::STANDARD
        .decode(photos[0]["data_base64"].as_str().unwrap())
        .unwrap();
    assert_eq!(embedded.len() as i64, photos[0]["size_bytes"].as_i64().unwrap());
    assert!(photos[0]["download_url"].as_str().unwrap().starts_with("/api/photos/"));
}

#[tokio::test]
async fn test_pending_list_over_http() {
    let app = create_test_app().await;
    let first = create_sheet(&app).await;
    let second = create_sheet(&app).await;

    send(&app, post_json(&format!("/api/companies/1/checkout-sheets/{}/cancel", first), json!({}))).await;

    let response = send(&app, get("/api/checkout-sheets/pending?company_id=1&platform=uber")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second]);

    let response = send(&app, get("/api/checkout-sheets/pending?platform=lyft")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_photo_is_rejected() {
    let config = EnvironmentConfig {
        max_upload_bytes: 40,
        ..Default::default()
    };
    let app = create_router(app_state_with(seeded_store().await, config));
    let id = create_sheet(&app).await;

    let response = send(
        &app,
        post_json(
            &format!("/api/companies/1/checkout-sheets/{}/vehicle-photos", id),
            json!({ "photos": [{ "category": "front", "data": general_purpose::STANDARD.encode(png_bytes(1)) }] }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_body_over_limit_is_payload_too_large() {
    let config = EnvironmentConfig {
        max_upload_bytes: 20,
        ..Default::default()
    };
    let app = create_router(app_state_with(seeded_store().await, config));
    let id = create_sheet(&app).await;

    let response = send(
        &app,
        post_json(
            &format!("/api/companies/1/checkout-sheets/{}/vehicle-photos", id),
            photo_set_body(),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_sequence_endpoints_provision_new_company() {
    let app = create_test_app().await;

    let response = send(&app, post_json("/api/companies/2/sequences", json!({}))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["doc_type"], "CHECKOUT_SHEET");
    assert_eq!(body["data"]["start_at"], 0);

    let response = send(&app, post_json("/api/companies/2/checkout-sheets", sheet_body())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["id"], 1);

    let response = send(
        &app,
        post_json("/api/companies/2/sequences/CHECKOUT_SHEET/next", json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["value"], 2);

    let response = send(
        &app,
        post_json("/api/companies/1/sequences/FUEL_ORDER/next", json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["kind"], "ALLOCATION_ERROR");

    let response = send(
        &app,
        post_json("/api/companies/2/sequences", json!({ "start_at": -1 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
