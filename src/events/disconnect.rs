use crate::common::context::Context;
use crate::models::connections::Connection;
use crate::usecases::{presences, streams};
use tracing::info;

/// Drops the connection from every stream and from presence. Persisted
/// state is left untouched.
pub fn handle<C: Context>(ctx: &C, connection: &Connection) {
    let streams_left = streams::unregister(ctx, connection.connection_id)
        .map_or(0, |removed| removed.streams.len());
    presences::set_offline(ctx, connection.connection_id);
    info!(
        connection_id = %connection.connection_id,
        streams_left,
        "Connection closed"
    );
}
