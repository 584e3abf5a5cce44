use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roombook::bookings::BookingStore;
use roombook::clock::{Clock, StoreClock};
use roombook::config::Config;
use roombook::database;
use roombook::notify::NotifyHub;
use roombook::reconciler::Reconciler;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting roombook maintenance daemon");

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database
    let db = database::init(&config.database_url).await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&db).await?;
    info!("Database migrations completed");

    let hub = Arc::new(NotifyHub::new());

    // Settings-driven clock: the whole daemon follows the admin's
    // simulated time when it is enabled.
    let clock = Arc::new(StoreClock::new(db.clone()));
    if let Err(err) = clock.refresh().await {
        warn!("initial clock refresh failed: {}", err);
    }
    let clock_handle = tokio::spawn(
        Arc::clone(&clock).run(Duration::from_secs(config.clock_refresh_secs)),
    );

    // Start the status reconciler
    let bookings = BookingStore::new(db.clone(), Arc::clone(&hub));
    let reconciler = Reconciler::new(
        bookings,
        Arc::clone(&clock) as Arc<dyn Clock>,
        Duration::from_secs(config.reconcile_interval_secs),
    );
    let reconcile_handle = tokio::spawn(async move { reconciler.run().await });

    // Handle shutdown gracefully
    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");

    reconcile_handle.abort();
    clock_handle.abort();

    info!("Daemon shutting down");
    Ok(())
}
