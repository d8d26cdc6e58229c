use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, store_error};
use crate::common::time::{from_millis, now_millis};
use crate::entities::messages::AppendMessageArgs;
use crate::models::connections::Connection;
use crate::models::gateway::{SendMessage, ServerEvent};
use crate::models::identities::IdentityRef;
use crate::models::messages::{Message, MessageKind, MessagePage};
use crate::repositories::messages;
use crate::repositories::streams::StreamName;
use crate::usecases::{conversations, notifications, streams};
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

pub const MESSAGES_PER_PAGE: u32 = 50;
pub const MESSAGE_MAX_LENGTH: usize = 1000;

// at most SPAM_RATE messages per sender within SPAM_WINDOW_MILLIS
const SPAM_RATE: i64 = 10;
const SPAM_WINDOW_MILLIS: i64 = 10_000;

/// Returns the trimmed body, rejecting blank or over-long ones.
pub fn validate_body(body: &str) -> ServiceResult<&str> {
    let body = body.trim();
    if body.is_empty() || body.chars().count() > MESSAGE_MAX_LENGTH {
        return Err(AppError::MessagesInvalidLength);
    }
    Ok(body)
}

fn validate_kind(kind: MessageKind) -> ServiceResult<()> {
    match kind {
        MessageKind::Text => Ok(()),
        MessageKind::Image | MessageKind::File => Err(AppError::MessagesUnsupportedKind),
    }
}

fn parse_page_token(page_token: &str) -> ServiceResult<i64> {
    match page_token.parse::<i64>() {
        Ok(seq) if seq > 0 => Ok(seq),
        _ => Err(AppError::MessagesInvalidPageToken),
    }
}

/// Durably appends a message. The body is validated before the store is
/// touched; unknown or inactive conversations are `ConversationsNotFound`.
pub async fn append<C: Context>(
    ctx: &C,
    conversation_id: Uuid,
    sender: &IdentityRef,
    receiver: &IdentityRef,
    body: &str,
    kind: MessageKind,
) -> ServiceResult<Message> {
    let body = validate_body(body)?;
    validate_kind(kind)?;

    let conversation_id = conversation_id.to_string();
    let args = AppendMessageArgs {
        conversation_id: &conversation_id,
        sender_kind: sender.kind.as_str(),
        sender_id: &sender.id,
        receiver_kind: receiver.kind.as_str(),
        receiver_id: &receiver.id,
        body,
        kind: kind.as_str(),
    };
    match messages::append(ctx, args).await {
        Ok(Some(message)) => Message::try_from(message),
        Ok(None) => Err(AppError::ConversationsNotFound),
        Err(e) => store_error(e),
    }
}

async fn check_rate_limit<C: Context>(ctx: &C, sender: &IdentityRef) -> ServiceResult<()> {
    let since = now_millis() - SPAM_WINDOW_MILLIS;
    match messages::count_sent_since(ctx, sender.kind.as_str(), &sender.id, since).await {
        Ok(count) if count >= SPAM_RATE => {
            warn!(sender = %sender, count, "Sender is rate limited");
            Err(AppError::MessagesRateLimited)
        }
        Ok(_) => Ok(()),
        Err(e) => store_error(e),
    }
}

/// Most recent page when `page_token` is absent, older pages after that.
/// Messages within a page are oldest first.
pub async fn list_page<C: Context>(
    ctx: &C,
    conversation_id: Uuid,
    page_token: Option<&str>,
) -> ServiceResult<MessagePage> {
    let before_seq = page_token.map(parse_page_token).transpose()?;
    let mut page = match messages::fetch_page(
        ctx,
        &conversation_id.to_string(),
        before_seq,
        MESSAGES_PER_PAGE + 1,
    )
    .await
    {
        Ok(page) => page,
        Err(e) => return store_error(e),
    };

    let has_more = page.len() > MESSAGES_PER_PAGE as usize;
    page.truncate(MESSAGES_PER_PAGE as usize);
    page.reverse();
    let next_page_token = match (has_more, page.first()) {
        (true, Some(oldest)) => Some(oldest.seq.to_string()),
        _ => None,
    };
    let messages = page
        .into_iter()
        .map(Message::try_from)
        .collect::<ServiceResult<Vec<_>>>()?;
    Ok(MessagePage {
        messages,
        next_page_token,
    })
}

/// Marks every unread message addressed to `reader` as read.
pub async fn mark_read<C: Context>(
    ctx: &C,
    conversation_id: Uuid,
    reader: &IdentityRef,
) -> ServiceResult<(u64, DateTime<Utc>)> {
    let read_at = now_millis();
    match messages::mark_read(
        ctx,
        &conversation_id.to_string(),
        reader.kind.as_str(),
        &reader.id,
        read_at,
    )
    .await
    {
        Ok(count) => Ok((count, from_millis(read_at))),
        Err(e) => store_error(e),
    }
}

/// Soft-deletes a message on behalf of its sender and tells the
/// conversation.
pub async fn delete<C: Context>(
    ctx: &C,
    message_id: Uuid,
    identity: &IdentityRef,
) -> ServiceResult<()> {
    let message = match messages::fetch_one(ctx, &message_id.to_string()).await {
        Ok(Some(message)) if message.deleted_at.is_none() => Message::try_from(message)?,
        Ok(_) => return Err(AppError::MessagesNotFound),
        Err(e) => return store_error(e),
    };
    if &message.sender != identity {
        return Err(AppError::MessagesForbidden);
    }
    match messages::soft_delete(ctx, &message_id.to_string()).await {
        Ok(0) => return Err(AppError::MessagesNotFound),
        Ok(_) => {}
        Err(e) => return store_error(e),
    }

    info!(message_id = %message_id, conversation_id = %message.conversation_id, "Message deleted");
    let event = ServerEvent::MessageDeleted {
        conversation_id: message.conversation_id,
        message_id,
    };
    streams::broadcast(
        ctx,
        StreamName::Conversation(message.conversation_id),
        event,
        &[],
    )
    .await;
    Ok(())
}

/// Fans a persisted message out to the conversation and the receiver, then
/// records the receiver's notification.
async fn deliver<C: Context>(
    ctx: C,
    message: Message,
    product_id: Option<String>,
    origin_connection_id: Uuid,
) {
    let delivered = ServerEvent::MessageDelivered(message.clone());
    streams::broadcast(
        &ctx,
        StreamName::Conversation(message.conversation_id),
        delivered.clone(),
        &[origin_connection_id],
    )
    .await;
    streams::broadcast(&ctx, StreamName::User(message.receiver.clone()), delivered, &[]).await;

    match notifications::on_message_delivered(&ctx, &message, product_id.as_deref()).await {
        Ok(notification) => {
            let event = ServerEvent::NotificationCreated(notification);
            streams::broadcast(&ctx, StreamName::User(message.receiver.clone()), event, &[]).await;
        }
        Err(e) => {
            warn!(message_id = %message.id, "Failed to create notification: {e:?}");
        }
    }
}

/// Handles a send from a live connection: persists the message, fans it out
/// and records the receiver's notification. Nothing is published unless the
/// append succeeded.
///
/// Delivery runs on its own task once the message is stored, so dropping
/// this future after the append still produces the notification.
pub async fn send<C: Context>(
    ctx: &C,
    connection: &Connection,
    args: &SendMessage,
) -> ServiceResult<Message> {
    let sender = connection.identity()?;
    validate_body(&args.body)?;
    validate_kind(args.kind)?;

    let conversation =
        conversations::fetch_for_participant(ctx, args.conversation_id, sender).await?;
    if conversation.counterpart(sender) != Some(&args.receiver) {
        return Err(AppError::MessagesInvalidReceiver);
    }
    check_rate_limit(ctx, sender).await?;

    let message = append(
        ctx,
        conversation.id,
        sender,
        &args.receiver,
        &args.body,
        args.kind,
    )
    .await?;
    info!(
        message_id = %message.id,
        conversation_id = %message.conversation_id,
        seq = message.seq,
        "Message appended"
    );

    let delivery = tokio::spawn(deliver(
        ctx.clone(),
        message.clone(),
        conversation.product_id,
        connection.connection_id,
    ));
    // awaited so fan-out keeps append order for this connection
    if let Err(e) = delivery.await {
        warn!(message_id = %message.id, "Message delivery task failed: {e}");
    }

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_bodies_are_rejected() {
        assert!(matches!(validate_body(""), Err(AppError::MessagesInvalidLength)));
        assert!(matches!(validate_body(" \n\t "), Err(AppError::MessagesInvalidLength)));
    }

    #[test]
    fn body_length_counts_characters() {
        assert!(validate_body(&"ü".repeat(MESSAGE_MAX_LENGTH)).is_ok());
        assert!(matches!(
            validate_body(&"ü".repeat(MESSAGE_MAX_LENGTH + 1)),
            Err(AppError::MessagesInvalidLength)
        ));
    }

    #[test]
    fn bodies_are_trimmed() {
        assert_eq!(validate_body("  hello  ").unwrap(), "hello");
    }

    #[test]
    fn only_text_is_accepted() {
        assert!(validate_kind(MessageKind::Text).is_ok());
        assert!(matches!(
            validate_kind(MessageKind::Image),
            Err(AppError::MessagesUnsupportedKind)
        ));
    }

    #[test]
    fn page_tokens_are_positive_sequences() {
        assert_eq!(parse_page_token("51").unwrap(), 51);
        assert!(parse_page_token("0").is_err());
        assert!(parse_page_token("abc").is_err());
        assert!(parse_page_token("-3").is_err());
    }
}
