use crate::common::context::Context;
use crate::common::error::AppError;
use crate::events::EventResult;
use crate::models::connections::Connection;
use crate::models::gateway::{ConversationArgs, ServerEvent};
use crate::repositories::streams::StreamName;
use crate::usecases::streams;

pub async fn handle<C: Context>(
    ctx: &C,
    connection: &Connection,
    args: ConversationArgs,
) -> EventResult {
    let identity = connection.identity()?;
    let stream_name = StreamName::Conversation(args.conversation_id);
    if !ctx.streams().is_joined(connection.connection_id, &stream_name) {
        return Err(AppError::ConversationsForbidden);
    }
    let event = ServerEvent::StopTyping {
        conversation_id: args.conversation_id,
        identity: identity.clone(),
    };
    streams::broadcast(ctx, stream_name, event, &[connection.connection_id]).await;
    Ok(None)
}
