use std::sync::Arc;

use bloblets_db::DbPool;

use crate::config::{ConfigError, ServiceConfig};

/// Shared state for the orchestrators.
///
/// Cheaply cloneable: the pool is reference counted and the configuration is
/// behind an `Arc`.
#[derive(Clone)]
pub struct ServiceState {
    pub pool: DbPool,
    pub config: Arc<ServiceConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl ServiceState {
    pub fn new(pool: DbPool, config: ServiceConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }

    /// Connect, verify the database is reachable and apply migrations.
    pub async fn connect(config: ServiceConfig) -> Result<Self, StartupError> {
        let pool = bloblets_db::create_pool(&config.db.database_url, config.db.max_connections).await?;
        tracing::info!(max_connections = config.db.max_connections, "Database connection pool created");

        bloblets_db::health_check(&pool).await?;
        bloblets_db::run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");

        Ok(Self::new(pool, config))
    }
}
