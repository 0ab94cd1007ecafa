//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación,
//! detección de imágenes, extractores HTTP y reintentos de lectura.

pub mod errors;
pub mod extractors;
pub mod image;
pub mod retry;
pub mod validation;
