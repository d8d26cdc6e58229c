pub mod disconnect;
pub mod join_conversation;
pub mod join_user_channel;
pub mod leave_conversation;
pub mod mark_read;
pub mod send_message;
pub mod stop_typing;
pub mod typing;

use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult};
use crate::models::connections::Connection;
use crate::models::gateway::{ClientEvent, ServerEvent};
use serde_json::Value;
use tracing::{debug, warn};

const SEND_MESSAGE_EVENT: &str = "send-message";

/// The reply for the originating connection, if any. Everything else a
/// handler produces is published through the streams.
pub type EventResult = ServiceResult<Option<ServerEvent>>;

pub async fn handle_event<C: Context>(
    ctx: &C,
    connection: &mut Connection,
    event: ClientEvent,
) -> EventResult {
    match event {
        ClientEvent::JoinUserChannel(args) => join_user_channel::handle(ctx, connection, args).await,
        ClientEvent::JoinConversation(args) => join_conversation::handle(ctx, connection, args).await,
        ClientEvent::LeaveConversation(args) => leave_conversation::handle(ctx, connection, args).await,
        ClientEvent::SendMessage(args) => send_message::handle(ctx, connection, args).await,
        ClientEvent::Typing(args) => typing::handle(ctx, connection, args).await,
        ClientEvent::StopTyping(args) => stop_typing::handle(ctx, connection, args).await,
        ClientEvent::MarkRead(args) => mark_read::handle(ctx, connection, args).await,
    }
}

/// The `clientTempId` of a `send-message` frame that failed strict decoding,
/// so the client can roll back its optimistic message.
fn rejected_send_temp_id(frame: &str) -> Option<String> {
    let frame: Value = serde_json::from_str(frame).ok()?;
    if frame.get("event")?.as_str()? != SEND_MESSAGE_EVENT {
        return None;
    }
    let client_temp_id = frame.get("data")?.get("clientTempId")?.as_str()?;
    Some(client_temp_id.to_owned())
}

/// Decodes one text frame and runs its handler. Failed sends are answered
/// with `message-error`, any other failure with `error`.
pub async fn handle_frame<C: Context>(
    ctx: &C,
    connection: &mut Connection,
    frame: &str,
) -> Option<ServerEvent> {
    let event: ClientEvent = match serde_json::from_str(frame) {
        Ok(event) => event,
        Err(e) => {
            debug!(connection_id = %connection.connection_id, "Rejected frame: {e}");
            let e = AppError::DecodingRequestFailed;
            return Some(match rejected_send_temp_id(frame) {
                Some(client_temp_id) => ServerEvent::message_error(client_temp_id, &e),
                None => ServerEvent::error(&e),
            });
        }
    };

    let event_name = event.name();
    let client_temp_id = match &event {
        ClientEvent::SendMessage(args) => Some(args.client_temp_id.clone()),
        _ => None,
    };
    match handle_event(ctx, connection, event).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(
                connection_id = %connection.connection_id,
                event = event_name,
                code = e.code(),
                "Event failed"
            );
            Some(match client_temp_id {
                Some(client_temp_id) => ServerEvent::message_error(client_temp_id, &e),
                None => ServerEvent::error(&e),
            })
        }
    }
}
