//! Systiva Server — application entry point.
//!
//! Wires the SurrealDB-backed catalog stores into the access engine.
//! The HTTP transport is provided by the deployment harness and calls
//! into the engine through its operation contract.

use systiva_access::AccessService;
use systiva_db::store::{SurrealGroupStore, SurrealRoleStore, SurrealUserStore};
use systiva_db::{DbConfig, DbManager};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("systiva=info")),
        )
        .json()
        .init();

    tracing::info!("Starting Systiva access-control server...");

    let config = DbConfig::from_env();
    let manager = match DbManager::connect(&config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = systiva_db::run_migrations(manager.client()).await {
        tracing::error!(error = %e, "failed to run migrations");
        std::process::exit(1);
    }

    let db = manager.client().clone();
    let _service = AccessService::new(
        SurrealUserStore::new(db.clone()),
        SurrealGroupStore::new(db.clone()),
        SurrealRoleStore::new(db),
    );

    tracing::info!("Catalog stores initialized; engine ready.");
    tracing::info!("Systiva server stopped.");
}
