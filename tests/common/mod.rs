#![allow(dead_code)]

use chrono::Utc;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rust_decimal::Decimal;
use std::io::Cursor;
use std::sync::Arc;

use fleet_checkout::config::EnvironmentConfig;
use fleet_checkout::models::checkout_sheet::{CreateCheckoutSheetInput, CHECKOUT_SHEET_DOC_TYPE};
use fleet_checkout::repositories::{InMemoryStore, SequenceRepository};
use fleet_checkout::AppState;

pub const COMPANY_ID: i64 = 1;
pub const DRIVER_ID: i64 = 4;
pub const VEHICLE_ID: i64 = 1;
pub const CHECK_ITEM_ID: i64 = 10;

/// Store con catálogos, vouchers 7 y 8 y el contador de la empresa 1
pub async fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.add_driver(DRIVER_ID, "Juan Pérez").await;
    store.add_driver(5, "Ana Gómez").await;
    store.add_vehicle(VEHICLE_ID, "TEST123").await;
    store.add_vehicle(2, "XYZ987").await;
    store.add_check_item(CHECK_ITEM_ID, "Espejos").await;
    store.add_check_item(11, "Neumáticos").await;
    store.add_voucher(7, "Primax", Decimal::new(5000, 2), "CUP-7").await;
    store.add_voucher(8, "Repsol", Decimal::new(3000, 2), "CUP-8").await;
    store
        .initialize(COMPANY_ID, CHECKOUT_SHEET_DOC_TYPE, 0)
        .await
        .expect("counter initialized");
    store
}

pub fn app_state(store: Arc<InMemoryStore>) -> AppState {
    app_state_with(store, EnvironmentConfig::default())
}

pub fn app_state_with(store: Arc<InMemoryStore>, config: EnvironmentConfig) -> AppState {
    AppState::new(store, config)
}

pub fn sheet_input() -> CreateCheckoutSheetInput {
    CreateCheckoutSheetInput {
        company_id: COMPANY_ID,
        platform: "UBER".to_string(),
        driver_id: DRIVER_ID,
        vehicle_id: VEHICLE_ID,
        plate: "TEST123".to_string(),
        odometer: 1000,
        fuel_percentage: 50,
        notes: Some(format!("salida {}", Utc::now().date_naive())),
    }
}

fn encode_image(format: ImageFormat, seed: u8) -> Vec<u8> {
    let pixels = RgbImage::from_fn(4, 4, |x, y| Rgb([seed, (x * 60) as u8, (y * 60) as u8]));
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(pixels)
        .write_to(&mut cursor, format)
        .expect("fixture image encodes");
    cursor.into_inner()
}

/// JPEG real de 4x4
pub fn jpeg_bytes() -> Vec<u8> {
    encode_image(ImageFormat::Jpeg, 0)
}

/// PNG real de 4x4; `seed` varía el contenido
pub fn png_bytes(seed: u8) -> Vec<u8> {
    encode_image(ImageFormat::Png, seed)
}
