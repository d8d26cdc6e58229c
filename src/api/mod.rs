use crate::adapters::{IdentityDirectory, ProductCatalog};
use crate::common::axum_ip::IpAddrInfo;
use crate::common::context::Context;
use crate::common::error::AppError;
use crate::common::init;
use crate::common::redis_pool::RedisPool;
use crate::common::state::AppState;
use crate::repositories::presences::PresenceTracker;
use crate::repositories::streams::ConnectionRegistry;
use crate::settings::AppSettings;
use crate::workers::daemons::relay_consumer;
use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::get;
use sqlx::{Any, Pool};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

pub mod gateway;
pub mod v1;

#[derive(Clone)]
pub struct RequestContext {
    pub state: AppState,
    pub request_ip: IpAddrInfo,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(gateway::upgrade))
        .nest("/api/v1", v1::router())
}

pub async fn index() -> &'static str {
    concat!("marketchat-service v", env!("CARGO_PKG_VERSION"))
}

pub async fn serve(settings: &AppSettings) -> anyhow::Result<()> {
    let state = init::initialize_state(settings).await?;
    if let Some(redis_settings) = &settings.redis {
        tokio::spawn(relay_consumer::serve(state.clone(), redis_settings.url.clone()));
    }

    let app = router().with_state(state);
    let listener = TcpListener::bind((settings.app_host, settings.app_port)).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ip_info = IpAddrInfo::from_request_parts(parts, state).await?;
        Ok(Self {
            state: state.clone(),
            request_ip: ip_info,
        })
    }
}

impl Context for RequestContext {
    fn db(&self) -> &Pool<Any> {
        self.state.db()
    }

    fn redis(&self) -> Option<&RedisPool> {
        self.state.redis()
    }

    fn streams(&self) -> &ConnectionRegistry {
        self.state.streams()
    }

    fn presences(&self) -> &PresenceTracker {
        self.state.presences()
    }

    fn identities(&self) -> &dyn IdentityDirectory {
        self.state.identities()
    }

    fn products(&self) -> &dyn ProductCatalog {
        self.state.products()
    }
}
