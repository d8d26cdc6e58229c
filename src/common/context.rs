use crate::adapters::{IdentityDirectory, ProductCatalog};
use crate::common::redis_pool::RedisPool;
use crate::repositories::presences::PresenceTracker;
use crate::repositories::streams::ConnectionRegistry;
use sqlx::{Any, Pool};

pub trait Context: Clone + Sync + Send + 'static {
    fn db(&self) -> &Pool<Any>;
    /// Present only when cross-instance relay is configured.
    fn redis(&self) -> Option<&RedisPool>;
    fn streams(&self) -> &ConnectionRegistry;
    fn presences(&self) -> &PresenceTracker;
    fn identities(&self) -> &dyn IdentityDirectory;
    fn products(&self) -> &dyn ProductCatalog;
}
