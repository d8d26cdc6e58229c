use crate::common::context::Context;
use crate::common::redis_json::Json;
use crate::entities::relay::RelayEnvelope;
use redis::AsyncCommands;
use std::ops::DerefMut;

pub const RELAY_CHANNEL: &str = "marketchat:relay";

/// Returns the number of subscribers that received the envelope, or
/// `None` when no Redis is configured.
pub async fn publish<C: Context>(ctx: &C, envelope: &RelayEnvelope) -> anyhow::Result<Option<u64>> {
    let Some(redis) = ctx.redis() else {
        return Ok(None);
    };
    let mut conn = redis.get().await?;
    let receivers: u64 = conn
        .deref_mut()
        .publish(RELAY_CHANNEL, Json(envelope))
        .await?;
    Ok(Some(receivers))
}
