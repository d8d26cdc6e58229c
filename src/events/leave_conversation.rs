use crate::common::context::Context;
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
    streams::leave(
        ctx,
        connection.connection_id,
        &StreamName::Conversation(args.conversation_id),
    );
    Ok(Some(ServerEvent::ConversationLeft {
        conversation_id: args.conversation_id,
    }))
}
