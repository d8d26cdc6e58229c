use crate::common::context::Context;
use crate::events::EventResult;
use crate::models::connections::Connection;
use crate::models::gateway::{SendMessage, ServerEvent};
use crate::usecases::messages;

pub async fn handle<C: Context>(ctx: &C, connection: &Connection, args: SendMessage) -> EventResult {
    let message = messages::send(ctx, connection, &args).await?;
    Ok(Some(ServerEvent::MessageAck {
        client_temp_id: args.client_temp_id,
        message,
    }))
}
