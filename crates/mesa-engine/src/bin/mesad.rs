//! # mesad
//!
//! The Mesa POS daemon: opens the database, runs migrations, and keeps the
//! scheduler sweeping until Ctrl-C.
//!
//! ## Configuration (environment)
//! ```text
//! MESA_DB_PATH   Path to the SQLite database file (default: mesa.db)
//! RUST_LOG       Tracing filter (default: info)
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;

use mesa_db::{Database, DbConfig};
use mesa_engine::{EngineConfig, Scheduler};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting mesad...");

    let db_path = std::env::var("MESA_DB_PATH").unwrap_or_else(|_| "mesa.db".to_string());
    let db = Database::new(DbConfig::new(&db_path)).await?;
    info!(path = %db_path, "Database ready");

    let (scheduler, handle) = Scheduler::new(db.clone(), EngineConfig::default());
    let scheduler_task = tokio::spawn(scheduler.run());

    info!("Scheduler running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    handle.shutdown().await;
    scheduler_task.await?;
    db.close().await;

    Ok(())
}
