use crate::common::context::Context;
use crate::entities::relay::RelayEnvelope;
use crate::models::gateway::ServerEvent;
use crate::models::identities::IdentityRef;
use crate::repositories::relay;
use crate::repositories::streams::{EventSender, RemovedConnection, StreamName};
use tracing::{debug, warn};
use uuid::Uuid;

pub fn register<C: Context>(ctx: &C, connection_id: Uuid, sender: EventSender) {
    ctx.streams().register(connection_id, sender);
}

pub fn bind_identity<C: Context>(ctx: &C, connection_id: Uuid, identity: IdentityRef) -> bool {
    ctx.streams().bind_identity(connection_id, identity)
}

pub fn join<C: Context>(ctx: &C, connection_id: Uuid, stream_name: StreamName) -> bool {
    let joined = ctx.streams().join(connection_id, stream_name.clone());
    if joined {
        debug!(connection_id = %connection_id, stream = %stream_name, "Joined stream");
    }
    joined
}

pub fn leave<C: Context>(ctx: &C, connection_id: Uuid, stream_name: &StreamName) -> bool {
    let left = ctx.streams().leave(connection_id, stream_name);
    if left {
        debug!(connection_id = %connection_id, stream = %stream_name, "Left stream");
    }
    left
}

/// Queues a reply for one local connection.
pub fn send<C: Context>(ctx: &C, connection_id: Uuid, event: ServerEvent) -> bool {
    ctx.streams().send(connection_id, event)
}

pub fn unregister<C: Context>(ctx: &C, connection_id: Uuid) -> Option<RemovedConnection> {
    ctx.streams().unregister(connection_id)
}

/// Publishes to local members and, when configured, to the other instances.
/// Relay failures are logged and never fail the publish.
pub async fn broadcast<C: Context>(
    ctx: &C,
    stream_name: StreamName,
    event: ServerEvent,
    excluded_connection_ids: &[Uuid],
) -> usize {
    let delivered = ctx
        .streams()
        .broadcast(&stream_name, &event, excluded_connection_ids);
    if ctx.redis().is_none() {
        return delivered;
    }

    let envelope = RelayEnvelope {
        origin: ctx.streams().instance_id(),
        stream: stream_name,
        event,
        excluded: excluded_connection_ids.to_vec(),
    };
    if let Err(e) = relay::publish(ctx, &envelope).await {
        warn!(stream = %envelope.stream, "Failed to relay event: {e:?}");
    }
    delivered
}

/// Delivers an envelope received from another instance to local members.
/// Envelopes this instance published itself are skipped.
pub fn deliver_relayed<C: Context>(ctx: &C, envelope: &RelayEnvelope) -> Option<usize> {
    if envelope.origin == ctx.streams().instance_id() {
        return None;
    }
    Some(
        ctx.streams()
            .broadcast(&envelope.stream, &envelope.event, &envelope.excluded),
    )
}
