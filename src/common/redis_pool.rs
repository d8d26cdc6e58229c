use crate::settings::RedisSettings;
use deadpool::Runtime;
use deadpool::managed::{Manager, Metrics, Object, Pool, PoolError, RecycleError, RecycleResult};
use redis::{AsyncConnectionConfig, RedisError, RedisResult};

pub struct RedisPoolManager {
    client: redis::Client,
    config: AsyncConnectionConfig,
}

impl RedisPoolManager {
    pub fn new(client: redis::Client, config: AsyncConnectionConfig) -> Self {
        Self { client, config }
    }
}

impl Manager for RedisPoolManager {
    type Type = redis::aio::MultiplexedConnection;
    type Error = RedisError;

    async fn create(&self) -> RedisResult<Self::Type> {
        self.client
            .get_multiplexed_async_connection_with_config(&self.config)
            .await
    }

    async fn recycle(&self, conn: &mut Self::Type, _metrics: &Metrics) -> RecycleResult<Self::Error> {
        let pong: String = redis::cmd("PING")
            .query_async(conn)
            .await
            .map_err(RecycleError::Backend)?;
        match pong.as_str() {
            "PONG" => Ok(()),
            _ => Err(RecycleError::Message("Unexpected PING response".into())),
        }
    }
}

pub type RedisPool = Pool<RedisPoolManager>;
pub type Connection = Object<RedisPoolManager>;
pub type Error = PoolError<RedisError>;
pub type PoolResult = Result<Connection, Error>;

pub fn build_pool(settings: &RedisSettings) -> anyhow::Result<RedisPool> {
    let client = redis::Client::open(settings.url.as_str())?;
    let config = AsyncConnectionConfig::new()
        .set_connection_timeout(settings.connection_timeout)
        .set_response_timeout(settings.response_timeout);
    let manager = RedisPoolManager::new(client, config);
    let pool = RedisPool::builder(manager)
        .max_size(settings.max_connections)
        .wait_timeout(Some(settings.wait_timeout))
        .create_timeout(Some(settings.connection_timeout))
        .runtime(Runtime::Tokio1)
        .build()?;
    Ok(pool)
}
