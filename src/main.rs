use std::sync::Arc;

use tokio::signal;
use tracing::info;

use netbank_api::background::PaymentScheduler;
use netbank_api::config::Config;
use netbank_api::services::{seed, ScheduleEngine};
use netbank_api::store::PgStore;
use netbank_api::{database, store::Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netbank_api=debug".into()),
        )
        .init();

    info!("Starting NetBank payments service...");

    let config = Config::from_env()?;
    info!("Configuration loaded");

    let db_pool = database::new_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&*db_pool).await?;
    info!("Database connection pool created");

    let store: Arc<dyn Store> = Arc::new(PgStore::new(db_pool));

    // Seed demo billers if the store is empty
    seed::seed_demo_data(store.as_ref()).await?;

    let engine = Arc::new(ScheduleEngine::new(store, &config.sender_name));

    // Start the cron-driven schedule scan
    let scheduler = PaymentScheduler::start(engine, &config.schedule_cron).await?;

    shutdown_signal().await;
    info!("Shutting down gracefully...");
    scheduler.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
