//! Conexión a PostgreSQL
//!
//! Un único pool por proceso con ciclo de vida explícito:
//! `connect` al arrancar, `close` al apagar.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::config::database::DatabaseConfig;

/// Pool de conexiones compartido por todos los repositorios
#[derive(Clone)]
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("🔌 Conectando a PostgreSQL: {}", mask_database_url(&config.url));
        let pool = config
            .create_pool()
            .await
            .context("no se pudo crear el pool de PostgreSQL")?;
        info!(
            "✅ Pool de PostgreSQL listo ({}-{} conexiones)",
            config.min_connections, config.max_connections
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Ejecutar migraciones de la base de datos
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("error ejecutando migraciones")?;
        info!("📦 Migraciones aplicadas");
        Ok(())
    }

    /// Verificar que la conexión funciona
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("🔌 Pool de PostgreSQL cerrado");
    }
}

/// Función helper para enmascarar la URL de la base de datos en logs
pub fn mask_database_url(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if url[..at_pos].contains(':') {
            let protocol = &url[..url.find("://").map(|p| p + 3).unwrap_or(0)];
            let host = &url[at_pos + 1..];
            return format!("{}***:***@{}", protocol, host);
        }
    }
    url.to_string()
}
