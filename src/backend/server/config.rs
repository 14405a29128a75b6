/**
 * Server Configuration
 *
 * Configuration is loaded from environment variables (after `.env` is read
 * by the binary), with defaults suitable for local development.
 *
 * | Variable             | Default          |
 * |----------------------|------------------|
 * | `SERVER_PORT`        | `3000`           |
 * | `JWT_SECRET`         | dev secret, warns |
 * | `ACCESS_COOKIE_NAME` | `access_token`   |
 * | `TOKEN_TTL_SECS`     | 30 days          |
 * | `DATABASE_URL`       | unset            |
 * | `WS_QUEUE_CAPACITY`  | `1000`           |
 *
 * # Error Handling
 *
 * Configuration errors are logged but do not prevent server startup. A
 * missing or unreachable database falls back to the in-memory store.
 */

use std::sync::Arc;

use sqlx::PgPool;

use crate::backend::realtime::DEFAULT_QUEUE_CAPACITY;
use crate::backend::store::{BoardStore, MemoryStore, PgStore};

const DEV_JWT_SECRET: &str = "taskboard-dev-secret-change-me";
const THIRTY_DAYS: u64 = 30 * 24 * 60 * 60;

/// Server settings read once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub jwt_secret: String,
    /// Cookie consulted when no explicit or bearer token is sent
    pub access_cookie_name: String,
    pub token_ttl_secs: u64,
    pub database_url: Option<String>,
    /// Events a socket may lag behind before it is disconnected
    pub ws_queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_cookie_name: "access_token".to_string(),
            token_ttl_secs: THIRTY_DAYS,
            database_url: None,
            ws_queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = parse_var("SERVER_PORT").unwrap_or(defaults.port);
        let token_ttl_secs = parse_var("TOKEN_TTL_SECS").unwrap_or(defaults.token_ttl_secs);
        let ws_queue_capacity = parse_var("WS_QUEUE_CAPACITY")
            .filter(|capacity: &usize| *capacity > 0)
            .unwrap_or(defaults.ws_queue_capacity);

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("[Auth] JWT_SECRET not set, using the development secret");
                defaults.jwt_secret
            }
        };

        let access_cookie_name = std::env::var("ACCESS_COOKIE_NAME")
            .ok()
            .filter(|name| !name.is_empty())
            .unwrap_or(defaults.access_cookie_name);

        let database_url = std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        Self {
            port,
            jwt_secret,
            access_cookie_name,
            token_ttl_secs,
            database_url,
            ws_queue_capacity,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("{} has an invalid value '{}', using the default", name, raw);
            None
        }
    }
}

/// Load and initialize the database connection pool
///
/// Returns `None` if `DATABASE_URL` is not set or the connection fails.
pub async fn load_database(config: &ServerConfig) -> Option<PgPool> {
    let database_url = match &config.database_url {
        Some(url) => url,
        None => {
            tracing::warn!("DATABASE_URL not set. Using the in-memory board store.");
            return None;
        }
    };

    tracing::info!("Connecting to database...");

    let pool = match PgPool::connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Using the in-memory board store.");
            return None;
        }
    };

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => tracing::info!("Database migrations completed successfully"),
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}

/// Pick the board store: PostgreSQL when reachable, memory otherwise
pub async fn load_store(config: &ServerConfig) -> Arc<dyn BoardStore> {
    match load_database(config).await {
        Some(pool) => Arc::new(PgStore::new(pool)),
        None => Arc::new(MemoryStore::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        std::env::remove_var("SERVER_PORT");
        std::env::remove_var("JWT_SECRET");
        std::env::remove_var("ACCESS_COOKIE_NAME");
        std::env::remove_var("TOKEN_TTL_SECS");
        std::env::remove_var("WS_QUEUE_CAPACITY");
        let config = ServerConfig::from_env();
        assert_eq!(config.port, 3000);
        assert_eq!(config.ws_queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.access_cookie_name, "access_token");
        assert_eq!(config.token_ttl_secs, THIRTY_DAYS);
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides_and_bad_values() {
        std::env::set_var("SERVER_PORT", "not-a-port");
        std::env::set_var("ACCESS_COOKIE_NAME", "tb_session");
        std::env::set_var("JWT_SECRET", "s3cret");
        std::env::set_var("WS_QUEUE_CAPACITY", "0");
        let config = ServerConfig::from_env();
        assert_eq!(config.port, 3000);
        assert_eq!(config.access_cookie_name, "tb_session");
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.ws_queue_capacity, DEFAULT_QUEUE_CAPACITY);
        std::env::remove_var("WS_QUEUE_CAPACITY");
        std::env::remove_var("SERVER_PORT");
        std::env::remove_var("ACCESS_COOKIE_NAME");
        std::env::remove_var("JWT_SECRET");
    }

    #[tokio::test]
    async fn test_store_falls_back_to_memory() {
        let config = ServerConfig::default();
        let store = load_store(&config).await;
        assert!(store.find_user(uuid::Uuid::new_v4()).await.unwrap().is_none());
    }
}
