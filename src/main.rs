use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use delivery_tracker::api;
use delivery_tracker::config::{AppConfig, StoreKind};
use delivery_tracker::domain::delivery::DeliveryCommandHandler;
use delivery_tracker::metrics::Metrics;
use delivery_tracker::store::{DeliveryStore, MemoryStore, ScyllaStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,delivery_tracker=debug")),
        )
        .init();

    tracing::info!("🚚 Starting Delivery API");

    let config = AppConfig::from_env()?;
    tracing::debug!(?config, "Loaded configuration");

    // === 1. Persistence store ===
    let store: Arc<dyn DeliveryStore> = match config.store {
        StoreKind::Memory => {
            tracing::warn!("Using in-memory store; deliveries are lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreKind::Scylla => {
            Arc::new(ScyllaStore::connect(&config.scylla_node, &config.scylla_keyspace).await?)
        }
    };

    // === 2. Metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!(
        "📊 Metrics registry created with {} metric families",
        metrics.registry().gather().len()
    );

    // === 3. Command handler ===
    let handler = web::Data::new(DeliveryCommandHandler::new(store).with_metrics(metrics.clone()));
    let metrics = web::Data::new(metrics);

    // === 4. HTTP gateway ===
    tracing::info!(
        host = %config.http_host,
        port = config.http_port,
        "Server listening on http://{}:{}",
        config.http_host,
        config.http_port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(api::cors())
            .app_data(handler.clone())
            .app_data(metrics.clone())
            .configure(api::configure)
    })
    .bind((config.http_host.as_str(), config.http_port))?
    .run()
    .await?;

    tracing::info!("Delivery API stopped");
    Ok(())
}
