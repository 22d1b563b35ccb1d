use std::time::Duration;

use log::debug;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use tokio::sync::RwLock;

use crate::config::GatewayConfig;
use crate::helpers;

/// The one live connection the gateway holds. Cloning shares the pool handle.
#[derive(Clone)]
pub struct ActiveConnection {
    pub database: String,
    pub pool: MySqlPool,
}

/// Shared gateway state: static config plus the single connection slot.
pub struct GatewayState {
    pub config: GatewayConfig,
    active: RwLock<Option<ActiveConnection>>,
}

impl GatewayState {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            active: RwLock::new(None),
        }
    }

    /// Open a pool against `database` and make it the active connection.
    /// A previously active pool is closed in the background; queries already
    /// holding its handle drain normally.
    pub async fn connect(&self, database: &str) -> Result<(), sqlx::Error> {
        let pool = create_mysql_pool(&self.config, database).await?;
        let replaced = {
            let mut slot = self.active.write().await;
            slot.replace(ActiveConnection {
                database: database.to_string(),
                pool,
            })
        };
        if let Some(old) = replaced {
            debug!("closing replaced pool for database '{}'", old.database);
            tokio::spawn(async move { old.pool.close().await });
        }
        Ok(())
    }

    /// Close and drop the active pool. Returns the database name that was
    /// connected, if any.
    pub async fn disconnect(&self) -> Option<String> {
        let taken = self.active.write().await.take();
        match taken {
            Some(conn) => {
                conn.pool.close().await;
                Some(conn.database)
            }
            None => None,
        }
    }

    /// Snapshot of the active connection. The read lock is held only for the
    /// clone, so a concurrent connect never waits on a running query.
    pub async fn current(&self) -> Option<ActiveConnection> {
        self.active.read().await.clone()
    }

    pub async fn database(&self) -> Option<String> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|conn| conn.database.clone())
    }
}

/// Build a MySQL pool for one database. `connect` pings eagerly, so a bad
/// host, credential, or database name fails here instead of on first query.
pub async fn create_mysql_pool(
    config: &GatewayConfig,
    database: &str,
) -> Result<MySqlPool, sqlx::Error> {
    let encoded_username = helpers::url_encode(&config.db_user);
    let encoded_password = helpers::url_encode(&config.db_password);
    let encoded_database = helpers::url_encode(database);
    let connection_string = format!(
        "mysql://{}:{}@{}:{}/{}",
        encoded_username, encoded_password, config.db_host, config.db_port, encoded_database
    );

    MySqlPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600)) // 10 minute idle timeout
        .max_lifetime(Duration::from_secs(3600)) // 1 hour max lifetime
        .test_before_acquire(true)
        .connect(&connection_string)
        .await
}
