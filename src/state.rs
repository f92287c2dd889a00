use std::sync::Arc;

use anyhow::Context;

use crate::db::{create_pool, run_migrations, DbPool};
use crate::notification::{NotificationService, PgNotificationStore};

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub notification_service: NotificationService,
}

impl AppState {
    /// Connects to Postgres, applies pending migrations and wires the service.
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        tracing::info!("Connecting to database...");
        let db = create_pool(&config.database_url, config.max_connections)
            .await
            .context("failed to connect to the notification database")?;

        tracing::info!("Running migrations...");
        run_migrations(&db)
            .await
            .context("failed to run notification migrations")?;

        let store = PgNotificationStore::new(db.clone());
        let notification_service =
            NotificationService::new(Arc::new(store), config.notification_channel_capacity);

        Ok(Self {
            db,
            config: Arc::new(config),
            notification_service,
        })
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub notification_channel_capacity: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            notification_channel_capacity: parse_var("NOTIFICATION_CHANNEL_CAPACITY", 100)?,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_defaults_when_unset() {
        let value: u32 = parse_var("NOTIFICATION_CENTER_TEST_UNSET_VAR", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_parse_var_reads_and_rejects() {
        std::env::set_var("NOTIFICATION_CENTER_TEST_CAPACITY", " 42 ");
        let value: usize = parse_var("NOTIFICATION_CENTER_TEST_CAPACITY", 100).unwrap();
        assert_eq!(value, 42);

        std::env::set_var("NOTIFICATION_CENTER_TEST_BAD_CAPACITY", "lots");
        assert!(parse_var::<usize>("NOTIFICATION_CENTER_TEST_BAD_CAPACITY", 100).is_err());
    }
}
