use crate::adapters::directory_service::HttpDirectory;
use crate::common::redis_pool::{self, RedisPool};
use crate::common::state::AppState;
use crate::settings::{AppSettings, RedisSettings};
use sqlx::any::AnyPoolOptions;
use sqlx::{Any, Pool};
use std::ops::DerefMut;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const MYSQL_SCHEMA: &str = include_str!("../../schema/mysql.sql");
const SQLITE_SCHEMA: &str = include_str!("../../schema/sqlite.sql");

pub fn initialize_logging(settings: &AppSettings) {
    tracing_subscriber::fmt()
        .with_max_level(settings.level)
        .with_timer(tracing_subscriber::fmt::time())
        .with_level(true)
        .with_target(false)
        .compact()
        .init();
}

pub async fn initialize_state(settings: &AppSettings) -> anyhow::Result<AppState> {
    let db = initialize_db(settings).await?;
    initialize_schema(&db).await?;
    let redis = match &settings.redis {
        Some(redis_settings) => Some(initialize_redis(redis_settings).await?),
        None => {
            info!("REDIS_URL not set, cross-instance relay disabled");
            None
        }
    };
    let directory = Arc::new(HttpDirectory::new(&settings.directory_service_base_url)?);
    Ok(AppState::new(db, redis, directory.clone(), directory))
}

pub async fn initialize_db(settings: &AppSettings) -> sqlx::Result<Pool<Any>> {
    connect_db(
        &settings.database_url,
        settings.db_max_connections as _,
        settings.db_wait_timeout,
    )
    .await
}

pub async fn connect_db(
    database_url: &str,
    max_connections: u32,
    wait_timeout: Duration,
) -> sqlx::Result<Pool<Any>> {
    sqlx::any::install_default_drivers();
    AnyPoolOptions::new()
        .acquire_timeout(wait_timeout)
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Applies the DDL matching the connected backend. Every statement is
/// idempotent, so this runs on every start-up.
pub async fn initialize_schema(db: &Pool<Any>) -> sqlx::Result<()> {
    let mut conn = db.acquire().await?;
    let schema = match conn.backend_name() {
        "MySQL" => MYSQL_SCHEMA,
        _ => SQLITE_SCHEMA,
    };
    for statement in schema.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement).execute(&mut *conn).await?;
    }
    Ok(())
}

pub async fn initialize_redis(settings: &RedisSettings) -> anyhow::Result<RedisPool> {
    let redis = redis_pool::build_pool(settings)?;
    let mut conn = redis.get().await?;
    let _: String = redis::cmd("PING").query_async(conn.deref_mut()).await?;
    Ok(redis)
}
