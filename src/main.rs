use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use fleet_checkout::config::{DatabaseConfig, EnvironmentConfig};
use fleet_checkout::database::DatabaseConnection;
use fleet_checkout::models::checkout_sheet::CHECKOUT_SHEET_DOC_TYPE;
use fleet_checkout::repositories::PgStore;
use fleet_checkout::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .init();

    info!("🚗 Fleet Checkout - Hojas de salida y autorización");
    info!("==================================================");
    info!(
        "⚙️ Entorno: {} | fotos requeridas: [{}] | máx. foto: {} bytes",
        config.environment,
        config
            .required_categories
            .as_slice()
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        config.max_upload_bytes
    );

    // Inicializar base de datos
    let db_config = DatabaseConfig::from_env()?;
    let db = match DatabaseConnection::connect(&db_config).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {:#}", e);
            return Err(e);
        }
    };
    db.run_migrations().await?;
    db.health_check().await?;

    if config.is_production() && config.cors_origins.is_empty() {
        warn!("⚠️ CORS_ORIGINS vacío en producción: se aceptan todos los orígenes");
    }

    let store = Arc::new(PgStore::new(db.pool().clone()));
    let addr: SocketAddr = config.server_url().parse()?;
    let bootstrap_companies = config.bootstrap_company_ids.clone();
    let state = AppState::new(store, config);

    // Contadores de hojas para las empresas configuradas (idempotente)
    for company_id in bootstrap_companies {
        state
            .sequences
            .initialize(company_id, CHECKOUT_SHEET_DOC_TYPE, 0)
            .await?;
    }

    let app = create_router(state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Estado del servicio");
    info!("📝 Hojas de salida:");
    info!("   POST /api/companies/:company_id/checkout-sheets - Crear hoja");
    info!("   GET  /api/companies/:company_id/checkout-sheets - Listar hojas");
    info!("   GET  /api/companies/:company_id/checkout-sheets/:sheet_id - Obtener hoja");
    info!("   POST /api/companies/:company_id/checkout-sheets/:sheet_id/annotations - Registrar nota");
    info!("   GET  /api/companies/:company_id/checkout-sheets/:sheet_id/annotations - Listar notas");
    info!("📸 Evidencia:");
    info!("   POST /api/companies/:company_id/checkout-sheets/:sheet_id/vehicle-photos - Subir fotos del vehículo");
    info!("   GET  /api/companies/:company_id/checkout-sheets/:sheet_id/vehicle-photos - Listar fotos del vehículo");
    info!("   POST /api/companies/:company_id/checkout-sheets/:sheet_id/item-photos - Subir foto de ítem");
    info!("   GET  /api/companies/:company_id/checkout-sheets/:sheet_id/item-photos - Listar fotos de ítems");
    info!("   GET  /api/companies/:company_id/checkout-sheets/:sheet_id/evidence - Revisión combinada");
    info!("   GET  /api/photos/:photo_id - Bytes de la foto");
    info!("✅ Autorización:");
    info!("   GET  /api/companies/:company_id/checkout-sheets/:sheet_id/readiness - Precondiciones");
    info!("   POST /api/companies/:company_id/checkout-sheets/:sheet_id/authorize - Autorizar con voucher");
    info!("   POST /api/companies/:company_id/checkout-sheets/:sheet_id/cancel - Cancelar hoja");
    info!("   GET  /api/checkout-sheets/pending - Hojas pendientes");
    info!("   GET  /api/vouchers/available - Vouchers disponibles");
    info!("🔢 Contadores:");
    info!("   POST /api/companies/:company_id/sequences - Provisionar contador");
    info!("   POST /api/companies/:company_id/sequences/:doc_type/next - Siguiente número");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Servidor terminó con error: {}", e);
    }

    db.close().await;
    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("⚠️ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("⚠️ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
