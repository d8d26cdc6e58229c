use crate::common::context::Context;
use crate::events::EventResult;
use crate::models::connections::Connection;
use crate::models::gateway::{MarkRead, ServerEvent};
use crate::repositories::streams::StreamName;
use crate::usecases::{conversations, messages, streams};
use tracing::debug;

pub async fn handle<C: Context>(ctx: &C, connection: &Connection, args: MarkRead) -> EventResult {
    let reader = connection.ensure_identity(&args.identity)?;
    let conversation =
        conversations::fetch_for_participant(ctx, args.conversation_id, reader).await?;
    let (count, read_at) = messages::mark_read(ctx, conversation.id, reader).await?;
    debug!(conversation_id = %conversation.id, reader = %reader, count, "Marked messages read");

    let event = ServerEvent::ReadReceipt {
        conversation_id: conversation.id,
        reader: reader.clone(),
        count,
        read_at,
    };
    streams::broadcast(ctx, StreamName::Conversation(conversation.id), event, &[]).await;
    Ok(None)
}
