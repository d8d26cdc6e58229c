use crate::common::env::{FromEnv, optional_env};
use std::env;
use std::net::IpAddr;
use std::ops::Deref;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::Level;

pub struct RedisSettings {
    pub url: String,
    pub max_connections: usize,
    pub connection_timeout: Duration,
    pub response_timeout: Duration,
    pub wait_timeout: Duration,
}

pub struct AppSettings {
    pub app_component: String,
    pub level: Level,
    pub app_host: IpAddr,
    pub app_port: u16,

    pub database_url: String,
    pub db_max_connections: usize,
    pub db_wait_timeout: Duration,

    /// Cross-instance fan-out is disabled when unset.
    pub redis: Option<RedisSettings>,

    pub directory_service_base_url: String,
}

impl AppSettings {
    pub fn load_from_env() -> anyhow::Result<Self> {
        let _ = dotenv::dotenv();

        let app_component = env::var("APP_COMPONENT")?;
        let level = Level::from_env_or("LOG_LEVEL", Level::INFO)?;
        let app_host = IpAddr::from_env("APP_HOST")?;
        let app_port = u16::from_env("APP_PORT")?;

        let database_url = env::var("DATABASE_URL")?;
        let db_max_connections = usize::from_env_or("DB_MAX_CONNECTIONS", 10)?;
        let db_wait_timeout_secs = u64::from_env_or("DB_WAIT_TIMEOUT_SECS", 5)?;
        let db_wait_timeout = Duration::from_secs(db_wait_timeout_secs);

        let redis = match optional_env("REDIS_URL") {
            None => None,
            Some(url) => {
                let max_connections = usize::from_env_or("REDIS_MAX_CONNECTIONS", 10)?;
                let connection_timeout_secs =
                    u64::from_env_or("REDIS_CONNECTION_TIMEOUT_SECS", 5)?;
                let response_timeout_secs = u64::from_env_or("REDIS_RESPONSE_TIMEOUT_SECS", 5)?;
                let wait_timeout_secs = u64::from_env_or("REDIS_WAIT_TIMEOUT_SECS", 5)?;
                Some(RedisSettings {
                    url,
                    max_connections,
                    connection_timeout: Duration::from_secs(connection_timeout_secs),
                    response_timeout: Duration::from_secs(response_timeout_secs),
                    wait_timeout: Duration::from_secs(wait_timeout_secs),
                })
            }
        };

        let directory_service_base_url = env::var("DIRECTORY_SERVICE_BASE_URL")?
            .trim_end_matches('/')
            .to_owned();

        Ok(AppSettings {
            app_component,
            level,
            app_port,
            app_host,

            database_url,
            db_max_connections,
            db_wait_timeout,

            redis,

            directory_service_base_url,
        })
    }

    pub fn get() -> &'static AppSettings {
        settings()
    }
}

pub fn settings() -> &'static AppSettings {
    static SETTINGS: LazyLock<AppSettings> =
        LazyLock::new(|| AppSettings::load_from_env().expect("Failed to load settings"));
    SETTINGS.deref()
}
