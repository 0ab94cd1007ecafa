//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Ninguna lectura hace panic: un valor mal formado se reporta como error.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::models::photo::RequiredCategories;
use crate::services::{ServiceSettings, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_READ_RETRY_ATTEMPTS};

/// Margen para el JSON/base64 que envuelve las fotos de un lote completo
const BODY_OVERHEAD_FACTOR: usize = 7;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub log_level: String,
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub request_timeout: Duration,
    pub read_retry_attempts: u32,
    pub required_categories: RequiredCategories,
    /// Empresas cuyo contador de hojas se provisiona al arrancar
    pub bootstrap_company_ids: Vec<i64>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            log_level: "info".to_string(),
            cors_origins: Vec::new(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            request_timeout: Duration::from_secs(30),
            read_retry_attempts: DEFAULT_READ_RETRY_ATTEMPTS,
            required_categories: RequiredCategories::default(),
            bootstrap_company_ids: Vec::new(),
        }
    }
}

impl EnvironmentConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construir la configuración a partir de cualquier fuente clave/valor
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let required_categories = match get("REQUIRED_VEHICLE_PHOTO_CATEGORIES") {
            Some(list) => RequiredCategories::parse_list(&list)
                .map_err(|e| anyhow::anyhow!("REQUIRED_VEHICLE_PHOTO_CATEGORIES: {}", e))?,
            None => defaults.required_categories,
        };

        let bootstrap_company_ids = get("BOOTSTRAP_COMPANY_IDS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|id| parse_or(Some(id.to_string()), "BOOTSTRAP_COMPANY_IDS", 0i64))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            environment: get("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_or(get("PORT"), "PORT", defaults.port)?,
            host: get("HOST").unwrap_or(defaults.host),
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
            cors_origins: get("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            max_upload_bytes: parse_or(get("MAX_UPLOAD_BYTES"), "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            request_timeout: Duration::from_secs(parse_or(
                get("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            read_retry_attempts: parse_or(
                get("READ_RETRY_ATTEMPTS"),
                "READ_RETRY_ATTEMPTS",
                defaults.read_retry_attempts,
            )?,
            required_categories,
            bootstrap_company_ids,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Límite del body HTTP: un lote de 5 fotos en base64 más el JSON
    pub fn request_body_limit(&self) -> usize {
        self.max_upload_bytes.saturating_mul(BODY_OVERHEAD_FACTOR)
    }

    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            max_upload_bytes: self.max_upload_bytes,
            read_retry_attempts: self.read_retry_attempts,
            required_categories: self.required_categories.clone(),
        }
    }
}

pub(crate) fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a valid number, got '{}'", key, raw)),
        None => Ok(default),
    }
}
