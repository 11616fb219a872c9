use std::time::Duration;

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DB: &str = "chess";

/// Connection settings for the MongoDB backend.
#[derive(Clone)]
pub struct MongoConfig {
    /// Driver options parsed from the connection URI.
    pub options: ClientOptions,
    /// Database holding the `savedGames` collection.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse `uri` and apply the pool bounds and timeouts the service relies on.
    pub async fn from_uri(
        uri: &str,
        db_name: Option<&str>,
        pool: MongoPoolSettings,
    ) -> MongoResult<Self> {
        let database_name = db_name.unwrap_or(DEFAULT_DB).to_owned();
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri { source })?;

        options.app_name = Some("chess-live-back".to_owned());
        options.max_pool_size = Some(pool.max_pool_size);
        options.min_pool_size = pool.min_pool_size;
        options.connect_timeout = Some(pool.timeout);
        options.server_selection_timeout = Some(pool.timeout);

        Ok(Self {
            options,
            database_name,
        })
    }

    /// Read `MONGO_URI` (required) and `MONGO_DB` (optional) from the environment.
    pub async fn from_env(pool: MongoPoolSettings) -> MongoResult<Self> {
        let uri = std::env::var("MONGO_URI")
            .map_err(|_| MongoDaoError::MissingEnvVar { var: "MONGO_URI" })?;
        let db = std::env::var("MONGO_DB").ok();
        Self::from_uri(&uri, db.as_deref(), pool).await
    }
}

/// Pool sizing and driver-level timeouts.
#[derive(Debug, Clone, Copy)]
pub struct MongoPoolSettings {
    /// Upper bound of pooled connections.
    pub max_pool_size: u32,
    /// Connections kept open while idle.
    pub min_pool_size: Option<u32>,
    /// Connect and server selection deadline.
    pub timeout: Duration,
}
