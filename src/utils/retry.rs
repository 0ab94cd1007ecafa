//! Reintentos de lecturas idempotentes
//!
//! Solo se reintentan errores de almacenamiento y solo desde operaciones de
//! lectura. Las escrituras (en especial authorize) nunca pasan por aquí.

use std::future::Future;
use std::time::Duration;

use crate::utils::errors::AppResult;

const BASE_DELAY_MS: u64 = 50;

pub async fn retry_read<T, F, Fut>(attempts: u32, operation: &str, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_retryable() && attempt < attempts => {
                tracing::warn!(
                    "🔁 Lectura '{}' falló (intento {}/{}): {}",
                    operation,
                    attempt,
                    attempts,
                    e
                );
                tokio::time::sleep(Duration::from_millis(BASE_DELAY_MS * attempt as u64)).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
