use crate::common::context::Context;
use crate::common::error::AppError;
use crate::events::EventResult;
use crate::models::connections::Connection;
use crate::models::gateway::{ConversationArgs, ServerEvent};
use crate::repositories::streams::StreamName;
use crate::usecases::{conversations, streams};

pub async fn handle<C: Context>(
    ctx: &C,
    connection: &Connection,
    args: ConversationArgs,
) -> EventResult {
    let identity = connection.identity()?;
    let conversation =
        conversations::fetch_for_participant(ctx, args.conversation_id, identity).await?;
    if !conversation.active {
        return Err(AppError::ConversationsNotFound);
    }

    streams::join(
        ctx,
        connection.connection_id,
        StreamName::Conversation(conversation.id),
    );
    conversations::touch_last_seen(ctx, conversation.id, identity).await?;
    Ok(Some(ServerEvent::ConversationJoined {
        conversation_id: conversation.id,
    }))
}
