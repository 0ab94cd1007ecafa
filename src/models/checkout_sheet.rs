//! Modelo de Checkout Sheet
//!
//! Hoja de salida de un vehículo: cabecera, plataforma, estado y voucher
//! asociado. Mapea a la tabla checkout_sheets (PK compuesta company_id + id).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::models::ParseEnumError;
use crate::utils::errors::{AppError, AppResult};

/// Tipo de documento usado para numerar las hojas de salida
pub const CHECKOUT_SHEET_DOC_TYPE: &str = "CHECKOUT_SHEET";

/// Identificador de una hoja: el id solo es único dentro de la empresa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetKey {
    pub company_id: i64,
    pub sheet_id: i64,
}

impl SheetKey {
    pub fn new(company_id: i64, sheet_id: i64) -> Self {
        Self { company_id, sheet_id }
    }
}

impl fmt::Display for SheetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.company_id, self.sheet_id)
    }
}

/// Plataforma para la que trabaja el conductor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    Uber,
    Didi,
    Cabify,
    Bolt,
    Indrive,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Uber,
        Platform::Didi,
        Platform::Cabify,
        Platform::Bolt,
        Platform::Indrive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Uber => "UBER",
            Platform::Didi => "DIDI",
            Platform::Cabify => "CABIFY",
            Platform::Bolt => "BOLT",
            Platform::Indrive => "INDRIVE",
        }
    }

    /// Parsear una plataforma recibida en la frontera HTTP
    pub fn parse(value: &str) -> AppResult<Self> {
        value
            .parse()
            .map_err(|e: ParseEnumError| AppError::Validation(e.to_string()))
    }
}

impl FromStr for Platform {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| ParseEnumError::new("platform", s))
    }
}

impl TryFrom<String> for Platform {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estado de la hoja. AUTHORIZED y CANCELLED son terminales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SheetState {
    Open,
    Authorized,
    Cancelled,
}

impl SheetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetState::Open => "OPEN",
            SheetState::Authorized => "AUTHORIZED",
            SheetState::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SheetState::Open)
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        value
            .parse()
            .map_err(|e: ParseEnumError| AppError::Validation(e.to_string()))
    }
}

impl FromStr for SheetState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(SheetState::Open),
            "AUTHORIZED" => Ok(SheetState::Authorized),
            "CANCELLED" => Ok(SheetState::Cancelled),
            _ => Err(ParseEnumError::new("sheet state", s)),
        }
    }
}

impl TryFrom<String> for SheetState {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for SheetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checkout Sheet principal - mapea a la tabla checkout_sheets
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CheckoutSheet {
    pub id: i64,
    pub company_id: i64,
    #[sqlx(try_from = "String")]
    pub platform: Platform,
    pub driver_id: i64,
    pub vehicle_id: i64,
    pub plate: String,
    pub odometer: i64,
    pub fuel_percentage: i16,
    pub notes: Option<String>,
    #[sqlx(try_from = "String")]
    pub state: SheetState,
    pub bound_voucher_id: Option<i64>,
    pub authorized_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CheckoutSheet {
    pub fn key(&self) -> SheetKey {
        SheetKey::new(self.company_id, self.id)
    }

    pub fn is_open(&self) -> bool {
        self.state == SheetState::Open
    }
}

/// Datos de entrada para abrir una hoja, validados una sola vez en el servicio.
/// Los rangos numéricos se comprueban en `CheckoutSheetService::create`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCheckoutSheetInput {
    pub company_id: i64,

    #[validate(length(min = 1, max = 20))]
    pub platform: String,

    pub driver_id: i64,

    pub vehicle_id: i64,

    #[validate(length(min = 1, max = 20))]
    pub plate: String,

    pub odometer: i64,

    pub fuel_percentage: i16,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Cabecera ya normalizada, lista para persistir
#[derive(Debug, Clone, PartialEq)]
pub struct NewCheckoutSheet {
    pub company_id: i64,
    pub platform: Platform,
    pub driver_id: i64,
    pub vehicle_id: i64,
    pub plate: String,
    pub odometer: i64,
    pub fuel_percentage: i16,
    pub notes: Option<String>,
}

impl NewCheckoutSheet {
    /// Construir la fila inicial (estado OPEN) con el id ya asignado
    pub fn into_sheet(self, id: i64, now: DateTime<Utc>) -> CheckoutSheet {
        CheckoutSheet {
            id,
            company_id: self.company_id,
            platform: self.platform,
            driver_id: self.driver_id,
            vehicle_id: self.vehicle_id,
            plate: self.plate,
            odometer: self.odometer,
            fuel_percentage: self.fuel_percentage,
            notes: self.notes,
            state: SheetState::Open,
            bound_voucher_id: None,
            authorized_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Orden de los listados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Filtros para búsqueda de hojas
#[derive(Debug, Clone, Default)]
pub struct SheetFilters {
    pub company_id: Option<i64>,
    pub id: Option<i64>,
    pub platform: Option<Platform>,
    pub plate: Option<String>,
    pub driver_name: Option<String>,
    pub state: Option<SheetState>,
    pub order: SheetOrder,
    pub limit: i64,
    pub offset: i64,
}

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 200;

impl SheetFilters {
    /// Normalizar paginación y textos vacíos
    pub fn normalized(mut self) -> Self {
        self.limit = match self.limit {
            l if l <= 0 => DEFAULT_LIST_LIMIT,
            l => l.min(MAX_LIST_LIMIT),
        };
        self.offset = self.offset.max(0);
        self.plate = non_blank(self.plate);
        self.driver_name = non_blank(self.driver_name);
        self
    }

    /// Evaluar los filtros contra una hoja (el nombre del conductor se resuelve aparte)
    pub fn matches(&self, sheet: &CheckoutSheet, driver_name: Option<&str>) -> bool {
        if self.company_id.is_some_and(|c| c != sheet.company_id) {
            return false;
        }
        if self.id.is_some_and(|id| id != sheet.id) {
            return false;
        }
        if self.platform.is_some_and(|p| p != sheet.platform) {
            return false;
        }
        if self.state.is_some_and(|s| s != sheet.state) {
            return false;
        }
        if let Some(plate) = &self.plate {
            if !contains_ignore_case(&sheet.plate, plate) {
                return false;
            }
        }
        if let Some(name) = &self.driver_name {
            match driver_name {
                Some(driver) if contains_ignore_case(driver, name) => {}
                _ => return false,
            }
        }
        true
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sheet() -> CheckoutSheet {
        NewCheckoutSheet {
            company_id: 1,
            platform: Platform::Uber,
            driver_id: 4,
            vehicle_id: 1,
            plate: "TEST123".to_string(),
            odometer: 1000,
            fuel_percentage: 50,
            notes: None,
        }
        .into_sheet(7, Utc::now())
    }

    #[test]
    fn test_platform_parse_is_case_insensitive() {
        assert_eq!(Platform::parse(" uber ").unwrap(), Platform::Uber);
        assert_eq!(Platform::parse("InDrive").unwrap(), Platform::Indrive);
        assert!(matches!(Platform::parse("lyft"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_sheet_state_terminality() {
        assert!(!SheetState::Open.is_terminal());
        assert!(SheetState::Authorized.is_terminal());
        assert!(SheetState::Cancelled.is_terminal());
        assert_eq!(SheetState::try_from("cancelled".to_string()).unwrap(), SheetState::Cancelled);
    }

    #[test]
    fn test_new_sheet_starts_open() {
        let sheet = sample_sheet();
        assert!(sheet.is_open());
        assert_eq!(sheet.key(), SheetKey::new(1, 7));
        assert!(sheet.bound_voucher_id.is_none());
    }

    #[test]
    fn test_filters_normalization() {
        let filters = SheetFilters {
            limit: 10_000,
            offset: -3,
            plate: Some("   ".to_string()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(filters.limit, MAX_LIST_LIMIT);
        assert_eq!(filters.offset, 0);
        assert!(filters.plate.is_none());
        assert_eq!(SheetFilters::default().normalized().limit, DEFAULT_LIST_LIMIT);
    }

    #[test]
    fn test_filters_match() {
        let sheet = sample_sheet();
        let by_plate = SheetFilters {
            plate: Some("st12".to_string()),
            ..Default::default()
        };
        assert!(by_plate.matches(&sheet, None));

        let by_driver = SheetFilters {
            driver_name: Some("pérez".to_string()),
            ..Default::default()
        };
        assert!(by_driver.matches(&sheet, Some("Juan Pérez")));
        assert!(!by_driver.matches(&sheet, None));

        let by_state = SheetFilters {
            state: Some(SheetState::Authorized),
            ..Default::default()
        };
        assert!(!by_state.matches(&sheet, None));
    }
}
