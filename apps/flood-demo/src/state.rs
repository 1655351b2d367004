//! Flood controller wiring - picks the event store from configuration.

use std::sync::Arc;

use flood_core::FloodController;
use flood_core::ports::{EventStore, FloodControl};
use flood_infra::InMemoryEventStore;

use crate::config::AppConfig;

/// Build the flood controller backed by Postgres when a database is configured.
pub async fn build_flood_control(config: &AppConfig) -> anyhow::Result<Arc<dyn FloodControl>> {
    #[cfg(feature = "postgres")]
    {
        if let Some(db_config) = &config.database {
            use anyhow::Context;
            use migration::{Migrator, MigratorTrait};

            let conn = flood_infra::connect(db_config)
                .await
                .context("Can't connect to the flood database")?;

            if config.auto_migrate {
                Migrator::up(&conn, None).await.context("Migration failed")?;
                tracing::info!("Flood schema is up to date");
            }

            let store = flood_infra::PostgresEventStore::new(conn);
            return Ok(Arc::new(controller(store, config)));
        }
    }

    tracing::warn!("DATABASE_URL not set. Using the in-memory event store; limits reset on restart.");
    Ok(Arc::new(controller(InMemoryEventStore::new(), config)))
}

fn controller<S: EventStore>(store: S, config: &AppConfig) -> FloodController<S> {
    let controller = FloodController::new(store, config.policy);
    match config.check_timeout {
        Some(timeout) => controller.with_timeout(timeout),
        None => controller,
    }
}
