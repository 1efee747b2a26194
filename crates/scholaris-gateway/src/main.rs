//! Scholaris Gateway - academic session HTTP API
//!
//! This is the main entry point for the gateway service. The control service
//! runs embedded in the same process, over a local RocksDB store.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scholaris_control::{ControlConfig, ControlService};
use scholaris_gateway::{create_router, GatewayConfig, GatewayState};
use scholaris_store::RocksStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,scholaris=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Scholaris Gateway");

    // Load configuration from environment
    let mut gateway_config = GatewayConfig::default();
    if let Ok(addr) = std::env::var("LISTEN_ADDR") {
        gateway_config.listen_addr = addr;
    }
    if let Ok(origins) = std::env::var("CORS_ORIGINS") {
        gateway_config.cors_origins = GatewayConfig::parse_origins(&origins);
    }
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/scholaris".into());

    tracing::info!(
        listen_addr = %gateway_config.listen_addr,
        data_dir = %data_dir,
        cors_origins = ?gateway_config.cors_origins,
        "Gateway configuration loaded"
    );

    tracing::info!(path = %data_dir, "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&data_dir)?);

    let control = Arc::new(ControlService::new(store, ControlConfig::default()));
    tracing::info!("Control service initialized");

    let listen_addr = gateway_config.listen_addr.clone();
    let state = GatewayState::new(control, gateway_config);
    let app = create_router(state);

    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
