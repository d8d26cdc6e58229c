use crate::common::context::Context;
use crate::models::identities::IdentityRef;
use tracing::info;
use uuid::Uuid;

pub fn set_online<C: Context>(ctx: &C, identity: &IdentityRef, connection_id: Uuid) {
    if ctx.presences().set_online(identity.clone(), connection_id) {
        info!(identity = %identity, "Identity came online");
    }
}

pub fn set_offline<C: Context>(ctx: &C, connection_id: Uuid) {
    if let Some((identity, true)) = ctx.presences().set_offline(connection_id) {
        info!(identity = %identity, "Identity went offline");
    }
}

pub fn is_online<C: Context>(ctx: &C, identity: &IdentityRef) -> bool {
    ctx.presences().is_online(identity)
}

pub fn online_count<C: Context>(ctx: &C) -> usize {
    ctx.presences().online_count()
}
