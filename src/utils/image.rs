//! Verificación de imágenes
//!
//! Los bytes recibidos se decodifican por completo con el crate `image`.
//! Una cabecera válida seguida de basura, un archivo truncado o contenido
//! doblemente codificado en base64 se rechazan antes de persistirlos.

use image::{GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;

pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_PNG: &str = "image/png";

const ACCEPTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

#[derive(Debug, thiserror::Error)]
pub enum ImageCheckError {
    #[error("payload is not a supported image (jpeg, png, gif, webp)")]
    Unsupported,
    #[error("image could not be decoded: {0}")]
    Corrupt(String),
}

/// Imagen que decodificó correctamente
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl VerifiedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }
}

/// Detectar el formato por contenido y decodificar la imagen completa
pub fn verify_image(bytes: &[u8]) -> Result<VerifiedImage, ImageCheckError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageCheckError::Corrupt(e.to_string()))?;

    let format = reader
        .format()
        .filter(|format| ACCEPTED_FORMATS.contains(format))
        .ok_or(ImageCheckError::Unsupported)?;

    let decoded = reader
        .decode()
        .map_err(|e| ImageCheckError::Corrupt(e.to_string()))?;
    let (width, height) = GenericImageView::dimensions(&decoded);

    Ok(VerifiedImage {
        format,
        width,
        height,
    })
}

/// Normalizar un MIME declarado por el cliente ("image/jpg" -> "image/jpeg")
pub fn normalize_declared_mime(value: &str) -> String {
    let base = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    match base.as_str() {
        "image/jpg" | "image/pjpeg" => MIME_JPEG.to_string(),
        _ => base,
    }
}
