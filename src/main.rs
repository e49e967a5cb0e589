mod config;
mod controllers;
mod database;
mod dto;
mod middleware;
mod models;
mod repositories;
mod routes;
mod services;
mod state;
mod utils;

use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use config::environment::EnvironmentConfig;
use config::pricing::PricingConfig;
use middleware::cors::{cors_middleware, cors_middleware_with_origins};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚗 Auction Marketplace - API de subastas de coches");
    info!("==================================================");

    let config = EnvironmentConfig::default();
    let pricing = PricingConfig::from_env();

    // Inicializar base de datos
    let pool = match database::connection::create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    if let Err(e) = database::connection::run_migrations(&pool).await {
        error!("❌ Error ejecutando migraciones: {}", e);
        return Err(anyhow::anyhow!("Error de migraciones: {}", e));
    }
    info!("✅ Migraciones aplicadas");

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let app_state = AppState::new(pool, config, pricing);

    // CORS abierto en desarrollo, restringido a los orígenes configurados
    let cors = if app_state.config.cors_origins.iter().any(|o| o == "*") {
        cors_middleware()
    } else {
        cors_middleware_with_origins(app_state.config.cors_origins.clone())
    };

    let app = routes::create_api_router(app_state.clone())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("👤 Endpoints - Users:");
    info!("   POST /api/users/register - Registrar usuario");
    info!("   POST /api/users/login - Login");
    info!("   POST /api/users/refresh-token - Renovar tokens");
    info!("   POST /api/users/change-password - Cambiar contraseña");
    info!("   POST /api/users/logout-all - Cerrar todas las sesiones");
    info!("   POST /api/users/assign-admin - Asignar rol admin");
    info!("   POST /api/users/revoke-admin - Revocar rol admin");
    info!("   DELETE /api/users/:id - Borrar cuenta");
    info!("🚙 Endpoints - Cars:");
    info!("   POST /api/cars - Registrar coche");
    info!("   GET  /api/cars - Listar coches (filtros + paginación)");
    info!("   GET  /api/cars/:id - Obtener coche");
    info!("   GET  /api/cars/:id/price - Tasación del coche");
    info!("   PUT  /api/cars/:id - Actualizar coche");
    info!("   DELETE /api/cars/:id - Eliminar coche");
    info!("🔨 Endpoints - Auctions:");
    info!("   POST /api/auctions - Crear subasta");
    info!("   GET  /api/auctions - Listar subastas");
    info!("   GET  /api/auctions/current - Subasta activa");
    info!("   GET  /api/auctions/:id - Obtener subasta");
    info!("   PATCH /api/auctions/:id - Actualizar subasta (upcoming)");
    info!("   POST /api/auctions/:id/close - Cierre manual");
    info!("   DELETE /api/auctions/:id - Eliminar subasta");
    info!("   POST /api/auctions/:id/cars - Añadir coches");
    info!("   DELETE /api/auctions/:id/cars/:carId - Retirar coche");
    info!("💰 Endpoints - Bids:");
    info!("   POST /api/bids/auctions/:id/bids - Colocar puja");
    info!("   GET  /api/bids/auctions/:id/details - Detalle con pujas");
    info!("   GET  /api/bids/my-bids - Mis pujas");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            anyhow::anyhow!(e)
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Espera ctrl-c o SIGTERM para el apagado ordenado
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("No se pudo instalar el handler de Ctrl+C");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("No se pudo instalar el handler de SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Señal de apagado recibida");
}
