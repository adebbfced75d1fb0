use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tracing::info;

use carrier_ops::api;
use carrier_ops::config::environment::EnvironmentConfig;
use carrier_ops::middleware::cors::cors_middleware;
use carrier_ops::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚚 Carrier Ops - Load Lifecycle API");
    info!("===================================");

    let config = EnvironmentConfig::default();

    // Almacén en memoria: reemplaza al document store remoto en desarrollo
    let app_state = AppState::with_in_memory_store(config.clone());
    info!("💾 Almacén en memoria inicializado");

    let app = api::create_api_router()
        .layer(cors_middleware())
        .with_state(app_state);

    let addr: SocketAddr = config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("📦 Endpoints de cargas:");
    info!("   POST /api/load - Crear carga");
    info!("   GET  /api/load - Listar cargas del fleet");
    info!("   GET  /api/load/:id - Obtener carga");
    info!("   GET  /api/load/:id/events - Eventos de auditoría de la carga");
    info!("   POST /api/load/:id/driver-action - Acción de driver (ARRIVE_PICKUP, DEPART_PICKUP, ARRIVE_DELIVERY, MARK_DELIVERED)");
    info!("   POST /api/load/:id/dispatcher-action - Acción de dispatcher (ASSIGN, REASSIGN, UNASSIGN, CANCEL, REACTIVATE)");
    info!("   POST /api/load/:id/documents - Subir documento (stub)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Error esperando señal de apagado: {}", e);
    }
    info!("👋 Apagando servidor");
}
