use crate::adapters::{IdentityDirectory, ProductCatalog};
use crate::common::context::Context;
use crate::common::redis_pool::RedisPool;
use crate::repositories::presences::PresenceTracker;
use crate::repositories::streams::ConnectionRegistry;
use sqlx::{Any, Pool};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Any>,
    pub redis: Option<RedisPool>,
    pub streams: Arc<ConnectionRegistry>,
    pub presences: Arc<PresenceTracker>,
    pub identities: Arc<dyn IdentityDirectory>,
    pub products: Arc<dyn ProductCatalog>,
}

impl AppState {
    /// State with fresh process-local registries.
    pub fn new(
        db: Pool<Any>,
        redis: Option<RedisPool>,
        identities: Arc<dyn IdentityDirectory>,
        products: Arc<dyn ProductCatalog>,
    ) -> Self {
        Self {
            db,
            redis,
            streams: Arc::new(ConnectionRegistry::new()),
            presences: Arc::new(PresenceTracker::new()),
            identities,
            products,
        }
    }
}

impl Context for AppState {
    fn db(&self) -> &Pool<Any> {
        &self.db
    }

    fn redis(&self) -> Option<&RedisPool> {
        self.redis.as_ref()
    }

    fn streams(&self) -> &ConnectionRegistry {
        &self.streams
    }

    fn presences(&self) -> &PresenceTracker {
        &self.presences
    }

    fn identities(&self) -> &dyn IdentityDirectory {
        self.identities.as_ref()
    }

    fn products(&self) -> &dyn ProductCatalog {
        self.products.as_ref()
    }
}
