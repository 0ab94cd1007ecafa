//! Backend en memoria
//!
//! Implementa los mismos traits que `PgStore` sobre mapas simples. Cada
//! operación toma el único mutex del store, así que todas son atómicas y
//! linealizables entre sí. Se usa en la suite de tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::annotation::ChecklistAnnotation;
use crate::models::authorization::{
    ensure_evidence_complete, ensure_sheet_open, ensure_voucher_available,
};
use crate::models::checkout_sheet::{
    CheckoutSheet, NewCheckoutSheet, SheetFilters, SheetKey, SheetOrder, SheetState,
};
use crate::models::photo::{
    ItemPhoto, NewItemPhoto, NewVehiclePhoto, PhotoContent, RequiredCategories, VehiclePhoto,
    VehiclePhotoCategory,
};
use crate::models::voucher::{FuelVoucher, VoucherState};
use crate::repositories::annotation_repository::AnnotationRepository;
use crate::repositories::authorization_repository::AuthorizationRepository;
use crate::repositories::catalog_repository::FleetCatalog;
use crate::repositories::checkout_sheet_repository::{
    sheet_not_found, sheet_not_open, CheckoutSheetRepository,
};
use crate::repositories::photo_repository::PhotoRepository;
use crate::repositories::sequence_repository::{uninitialized_counter, SequenceRepository};
use crate::repositories::voucher_repository::VoucherLedger;
use crate::repositories::StoreHealth;
use crate::utils::errors::{AppError, AppResult};

type SheetMapKey = (i64, i64);

#[derive(Debug, Default)]
struct MemoryData {
    sequences: HashMap<(i64, String), i64>,
    sheets: BTreeMap<SheetMapKey, CheckoutSheet>,
    annotations: BTreeMap<(i64, i64, i64), ChecklistAnnotation>,
    vehicle_photos: BTreeMap<(i64, i64, VehiclePhotoCategory), VehiclePhoto>,
    item_photos: Vec<ItemPhoto>,
    vouchers: BTreeMap<i64, FuelVoucher>,
    drivers: HashMap<i64, String>,
    vehicles: HashMap<i64, String>,
    check_items: HashMap<i64, String>,
}

fn map_key(key: SheetKey) -> SheetMapKey {
    (key.company_id, key.sheet_id)
}

impl MemoryData {
    fn next_sequence(&mut self, company_id: i64, doc_type: &str) -> AppResult<i64> {
        let counter = self
            .sequences
            .get_mut(&(company_id, doc_type.to_string()))
            .ok_or_else(|| uninitialized_counter(company_id, doc_type))?;
        *counter += 1;
        Ok(*counter)
    }

    /// Equivalente al FOR SHARE de Postgres: existe y está OPEN
    fn open_sheet(&self, key: SheetKey) -> AppResult<&CheckoutSheet> {
        let sheet = self
            .sheets
            .get(&map_key(key))
            .ok_or_else(|| sheet_not_found(key))?;
        if sheet.state.is_terminal() {
            return Err(sheet_not_open(key, sheet.state));
        }
        Ok(sheet)
    }

    fn present_categories(&self, key: SheetKey) -> Vec<VehiclePhotoCategory> {
        // BTreeMap ordenado por categoría: ya sale en orden canónico
        self.vehicle_photos
            .range((key.company_id, key.sheet_id, VehiclePhotoCategory::Front)..)
            .take_while(|((c, s, _), _)| *c == key.company_id && *s == key.sheet_id)
            .map(|((_, _, category), _)| *category)
            .collect()
    }

    fn voucher_bound_to_sheet(&self, voucher_id: i64) -> bool {
        self.sheets
            .values()
            .any(|s| s.bound_voucher_id == Some(voucher_id))
    }
}

/// Store en memoria con la misma semántica que el backend PostgreSQL
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: Mutex<MemoryData>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_driver(&self, id: i64, full_name: &str) {
        self.data.lock().await.drivers.insert(id, full_name.to_string());
    }

    pub async fn add_vehicle(&self, id: i64, plate: &str) {
        self.data.lock().await.vehicles.insert(id, plate.to_string());
    }

    pub async fn add_check_item(&self, id: i64, name: &str) {
        self.data.lock().await.check_items.insert(id, name.to_string());
    }

    pub async fn add_voucher(
        &self,
        id: i64,
        provider: &str,
        value: Decimal,
        coupon: &str,
    ) -> FuelVoucher {
        let now = Utc::now();
        let voucher = FuelVoucher {
            id,
            provider: provider.to_string(),
            value,
            coupon: coupon.to_string(),
            state: VoucherState::Available,
            created_at: now,
            updated_at: now,
        };
        self.data.lock().await.vouchers.insert(id, voucher.clone());
        voucher
    }
}

#[async_trait]
impl StoreHealth for InMemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl SequenceRepository for InMemoryStore {
    async fn initialize(&self, company_id: i64, doc_type: &str, start_at: i64) -> AppResult<()> {
        self.data
            .lock()
            .await
            .sequences
            .entry((company_id, doc_type.to_string()))
            .or_insert(start_at);
        Ok(())
    }

    async fn next_value(&self, company_id: i64, doc_type: &str) -> AppResult<i64> {
        self.data.lock().await.next_sequence(company_id, doc_type)
    }
}

#[async_trait]
impl CheckoutSheetRepository for InMemoryStore {
    async fn create(
        &self,
        doc_type: &str,
        sheet: &NewCheckoutSheet,
        now: DateTime<Utc>,
    ) -> AppResult<CheckoutSheet> {
        let mut data = self.data.lock().await;
        let id = data.next_sequence(sheet.company_id, doc_type)?;
        let created = sheet.clone().into_sheet(id, now);
        if data.sheets.contains_key(&(created.company_id, id)) {
            return Err(AppError::Storage(format!(
                "duplicate checkout sheet key {}",
                created.key()
            )));
        }
        data.sheets.insert((created.company_id, id), created.clone());
        Ok(created)
    }

    async fn find(&self, key: SheetKey) -> AppResult<Option<CheckoutSheet>> {
        Ok(self.data.lock().await.sheets.get(&map_key(key)).cloned())
    }

    async fn list(&self, filters: &SheetFilters) -> AppResult<Vec<CheckoutSheet>> {
        let data = self.data.lock().await;
        let mut sheets: Vec<CheckoutSheet> = data
            .sheets
            .values()
            .filter(|sheet| {
                let driver = data.drivers.get(&sheet.driver_id).map(String::as_str);
                filters.matches(sheet, driver)
            })
            .cloned()
            .collect();

        sheets.sort_by(|a, b| {
            (a.created_at, a.company_id, a.id).cmp(&(b.created_at, b.company_id, b.id))
        });
        if filters.order == SheetOrder::NewestFirst {
            sheets.reverse();
        }

        Ok(sheets
            .into_iter()
            .skip(filters.offset.max(0) as usize)
            .take(filters.limit.max(0) as usize)
            .collect())
    }
}

#[async_trait]
impl AnnotationRepository for InMemoryStore {
    async fn upsert(
        &self,
        key: SheetKey,
        check_item_id: i64,
        text: &str,
        now: DateTime<Utc>,
    ) -> AppResult<ChecklistAnnotation> {
        let mut data = self.data.lock().await;
        data.open_sheet(key)?;

        let annotation = data
            .annotations
            .entry((key.company_id, key.sheet_id, check_item_id))
            .and_modify(|a| {
                a.text = text.to_string();
                a.updated_at = now;
            })
            .or_insert_with(|| ChecklistAnnotation {
                id: Uuid::new_v4(),
                company_id: key.company_id,
                sheet_id: key.sheet_id,
                check_item_id,
                text: text.to_string(),
                created_at: now,
                updated_at: now,
            });

        Ok(annotation.clone())
    }

    async fn list_by_sheet(&self, key: SheetKey) -> AppResult<Vec<ChecklistAnnotation>> {
        let data = self.data.lock().await;
        Ok(data
            .annotations
            .range((key.company_id, key.sheet_id, i64::MIN)..=(key.company_id, key.sheet_id, i64::MAX))
            .map(|(_, a)| a.clone())
            .collect())
    }
}

#[async_trait]
impl PhotoRepository for InMemoryStore {
    async fn upsert_vehicle_photos(
        &self,
        key: SheetKey,
        photos: &[NewVehiclePhoto],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<VehiclePhoto>> {
        let mut data = self.data.lock().await;
        data.open_sheet(key)?;

        let mut saved = Vec::with_capacity(photos.len());
        for new_photo in photos {
            let photo = data
                .vehicle_photos
                .entry((key.company_id, key.sheet_id, new_photo.category))
                .and_modify(|p| {
                    p.content = new_photo.photo.content.clone();
                    p.filename = new_photo.photo.filename.clone();
                    p.size_bytes = new_photo.photo.size_bytes();
                    p.mime_type = new_photo.photo.mime_type.clone();
                    p.updated_at = now;
                })
                .or_insert_with(|| VehiclePhoto {
                    id: Uuid::new_v4(),
                    company_id: key.company_id,
                    sheet_id: key.sheet_id,
                    category: new_photo.category,
                    content: new_photo.photo.content.clone(),
                    filename: new_photo.photo.filename.clone(),
                    size_bytes: new_photo.photo.size_bytes(),
                    mime_type: new_photo.photo.mime_type.clone(),
                    created_at: now,
                    updated_at: now,
                });
            saved.push(photo.clone());
        }

        Ok(saved)
    }

    async fn insert_item_photo(
        &self,
        key: SheetKey,
        photo: &NewItemPhoto,
        now: DateTime<Utc>,
    ) -> AppResult<ItemPhoto> {
        let mut data = self.data.lock().await;
        data.open_sheet(key)?;

        let saved = ItemPhoto {
            id: Uuid::new_v4(),
            company_id: key.company_id,
            sheet_id: key.sheet_id,
            check_item_id: photo.check_item_id,
            content: photo.photo.content.clone(),
            filename: photo.photo.filename.clone(),
            size_bytes: photo.photo.size_bytes(),
            mime_type: photo.photo.mime_type.clone(),
            created_at: now,
            updated_at: now,
        };
        data.item_photos.push(saved.clone());
        Ok(saved)
    }

    async fn vehicle_photos(&self, key: SheetKey) -> AppResult<Vec<VehiclePhoto>> {
        let data = self.data.lock().await;
        let mut photos: Vec<VehiclePhoto> = data
            .vehicle_photos
            .values()
            .filter(|p| p.company_id == key.company_id && p.sheet_id == key.sheet_id)
            .cloned()
            .collect();
        photos.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(photos)
    }

    async fn item_photos(&self, key: SheetKey) -> AppResult<Vec<ItemPhoto>> {
        let data = self.data.lock().await;
        let mut photos: Vec<ItemPhoto> = data
            .item_photos
            .iter()
            .filter(|p| p.company_id == key.company_id && p.sheet_id == key.sheet_id)
            .cloned()
            .collect();
        photos.sort_by(|a, b| {
            (a.check_item_id, a.created_at, a.id).cmp(&(b.check_item_id, b.created_at, b.id))
        });
        Ok(photos)
    }

    async fn photo_content(&self, photo_id: Uuid) -> AppResult<Option<PhotoContent>> {
        let data = self.data.lock().await;
        let vehicle = data
            .vehicle_photos
            .values()
            .find(|p| p.id == photo_id)
            .map(|p| PhotoContent {
                content: p.content.clone(),
                mime_type: p.mime_type.clone(),
                filename: p.filename.clone(),
            });
        if vehicle.is_some() {
            return Ok(vehicle);
        }

        Ok(data
            .item_photos
            .iter()
            .find(|p| p.id == photo_id)
            .map(|p| PhotoContent {
                content: p.content.clone(),
                mime_type: p.mime_type.clone(),
                filename: p.filename.clone(),
            }))
    }

    async fn present_categories(&self, key: SheetKey) -> AppResult<Vec<VehiclePhotoCategory>> {
        Ok(self.data.lock().await.present_categories(key))
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryStore {
    async fn authorize(
        &self,
        key: SheetKey,
        voucher_id: i64,
        required: &RequiredCategories,
        now: DateTime<Utc>,
    ) -> AppResult<CheckoutSheet> {
        let mut data = self.data.lock().await;

        ensure_sheet_open(key, data.sheets.get(&map_key(key)))?;

        let present = data.present_categories(key);
        ensure_evidence_complete(required, &present)?;

        let bound_to_sheet = data.voucher_bound_to_sheet(voucher_id);
        ensure_voucher_available(voucher_id, data.vouchers.get(&voucher_id), bound_to_sheet)?;

        if let Some(voucher) = data.vouchers.get_mut(&voucher_id) {
            voucher.state = VoucherState::Bound;
            voucher.updated_at = now;
        }

        let sheet = data
            .sheets
            .get_mut(&map_key(key))
            .ok_or_else(|| sheet_not_found(key))?;
        sheet.state = SheetState::Authorized;
        sheet.bound_voucher_id = Some(voucher_id);
        sheet.authorized_at = Some(now);
        sheet.updated_at = now;

        Ok(sheet.clone())
    }

    async fn cancel(&self, key: SheetKey, now: DateTime<Utc>) -> AppResult<CheckoutSheet> {
        let mut data = self.data.lock().await;
        let sheet = data
            .sheets
            .get_mut(&map_key(key))
            .ok_or_else(|| sheet_not_found(key))?;
        if sheet.state.is_terminal() {
            return Err(sheet_not_open(key, sheet.state));
        }

        sheet.state = SheetState::Cancelled;
        sheet.cancelled_at = Some(now);
        sheet.updated_at = now;
        Ok(sheet.clone())
    }
}

#[async_trait]
impl VoucherLedger for InMemoryStore {
    async fn find_voucher(&self, voucher_id: i64) -> AppResult<Option<FuelVoucher>> {
        Ok(self.data.lock().await.vouchers.get(&voucher_id).cloned())
    }

    async fn available_vouchers(&self, limit: i64) -> AppResult<Vec<FuelVoucher>> {
        let data = self.data.lock().await;
        Ok(data
            .vouchers
            .values()
            .filter(|v| v.is_available() && !data.voucher_bound_to_sheet(v.id))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FleetCatalog for InMemoryStore {
    async fn driver_exists(&self, driver_id: i64) -> AppResult<bool> {
        Ok(self.data.lock().await.drivers.contains_key(&driver_id))
    }

    async fn vehicle_exists(&self, vehicle_id: i64) -> AppResult<bool> {
        Ok(self.data.lock().await.vehicles.contains_key(&vehicle_id))
    }

    async fn check_item_exists(&self, check_item_id: i64) -> AppResult<bool> {
        Ok(self.data.lock().await.check_items.contains_key(&check_item_id))
    }
}
