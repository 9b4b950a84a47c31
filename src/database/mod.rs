pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

use std::sync::Arc;
use tracing::warn;

use crate::config::AppConfig;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{GroupCount, ResearchFilter, ResearchTotals, Store};

/// Pick the backend for this process: Postgres when `DATABASE_URL` is set,
/// otherwise an in-memory store that forgets everything on exit.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn Store>, DatabaseError> {
    if config.database.url.is_none() {
        warn!("DATABASE_URL is not set; using the in-memory store");
        return Ok(Arc::new(MemoryStore::with_default_roles()));
    }

    let pool = DatabaseManager::connect(&config.database).await?;
    if config.database.run_migrations {
        DatabaseManager::migrate(&pool).await?;
    }
    Ok(Arc::new(PgStore::new(pool)))
}
