use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, is_unique_violation, store_error, unexpected};
use crate::common::time::{from_millis, now_millis};
use crate::entities::notifications::CreateNotificationArgs;
use crate::models::identities::IdentityRef;
use crate::models::messages::Message;
use crate::models::notifications::Notification;
use crate::repositories::notifications;
use tracing::{debug, info};
use uuid::Uuid;

pub const NOTIFICATIONS_PER_PAGE: u32 = 20;
const SNIPPET_LENGTH: usize = 100;
const TITLE_MAX_LENGTH: usize = 255;
const FALLBACK_TITLE: &str = "New message";

fn snippet(body: &str) -> String {
    match body.char_indices().nth(SNIPPET_LENGTH) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_owned(),
    }
}

fn truncate_title(mut title: String) -> String {
    if let Some((end, _)) = title.char_indices().nth(TITLE_MAX_LENGTH) {
        title.truncate(end);
    }
    title
}

async fn build_title<C: Context>(
    ctx: &C,
    sender: &IdentityRef,
    product_id: Option<&str>,
) -> String {
    let sender_name = match ctx.identities().resolve_identity(sender).await {
        Ok(sender_name) => sender_name,
        Err(e) => {
            debug!(sender = %sender, "Falling back to generic notification title: {e:?}");
            return FALLBACK_TITLE.to_owned();
        }
    };
    let product_name = match product_id {
        Some(product_id) => ctx.products().resolve_product(product_id).await.ok(),
        None => None,
    };
    let title = match product_name {
        Some(product_name) => format!("New message from {sender_name} about {product_name}"),
        None => format!("New message from {sender_name}"),
    };
    truncate_title(title)
}

/// Records the durable notification for a delivered message. Calling this
/// again for the same message returns the existing notification.
pub async fn on_message_delivered<C: Context>(
    ctx: &C,
    message: &Message,
    product_id: Option<&str>,
) -> ServiceResult<Notification> {
    let related_message_id = message.id.to_string();
    match notifications::fetch_one_by_message(ctx, &related_message_id).await {
        Ok(Some(notification)) => return Notification::try_from(notification),
        Ok(None) => {}
        Err(e) => return store_error(e),
    }

    let title = build_title(ctx, &message.sender, product_id).await;
    let body = snippet(&message.body);
    let related_conversation_id = message.conversation_id.to_string();
    let args = CreateNotificationArgs {
        recipient_kind: message.receiver.kind.as_str(),
        recipient_id: &message.receiver.id,
        sender_kind: message.sender.kind.as_str(),
        sender_id: &message.sender.id,
        related_message_id: &related_message_id,
        related_conversation_id: &related_conversation_id,
        title: &title,
        body: &body,
    };
    match notifications::create(ctx, args).await {
        Ok(notification) => {
            debug!(
                notification_id = %notification.id,
                recipient = %message.receiver,
                "Notification created"
            );
            Notification::try_from(notification)
        }
        Err(e) if is_unique_violation(&e) => {
            match notifications::fetch_one_by_message(ctx, &related_message_id).await {
                Ok(Some(notification)) => Notification::try_from(notification),
                Ok(None) => unexpected(e),
                Err(e) => store_error(e),
            }
        }
        Err(e) => store_error(e),
    }
}

pub async fn unread_count<C: Context>(ctx: &C, identity: &IdentityRef) -> ServiceResult<u64> {
    match notifications::unread_count(ctx, identity.kind.as_str(), &identity.id).await {
        Ok(count) => Ok(count.max(0) as u64),
        Err(e) => store_error(e),
    }
}

/// Newest first.
pub async fn list<C: Context>(
    ctx: &C,
    identity: &IdentityRef,
    page: u32,
) -> ServiceResult<Vec<Notification>> {
    let offset = page.saturating_mul(NOTIFICATIONS_PER_PAGE);
    let notifications = match notifications::fetch_page(
        ctx,
        identity.kind.as_str(),
        &identity.id,
        NOTIFICATIONS_PER_PAGE,
        offset,
    )
    .await
    {
        Ok(notifications) => notifications,
        Err(e) => return store_error(e),
    };
    notifications
        .into_iter()
        .map(Notification::try_from)
        .collect()
}

pub async fn mark_read<C: Context>(
    ctx: &C,
    notification_id: Uuid,
    identity: &IdentityRef,
) -> ServiceResult<Notification> {
    let notification_id = notification_id.to_string();
    let notification = match notifications::fetch_one(ctx, &notification_id).await {
        Ok(Some(notification)) => Notification::try_from(notification)?,
        Ok(None) => return Err(AppError::NotificationsNotFound),
        Err(e) => return store_error(e),
    };
    if &notification.recipient != identity {
        return Err(AppError::NotificationsForbidden);
    }
    if notification.is_read {
        return Ok(notification);
    }
    let read_at = now_millis();
    match notifications::mark_read(ctx, &notification_id, read_at).await {
        Ok(_) => Ok(Notification {
            is_read: true,
            read_at: Some(from_millis(read_at)),
            ..notification
        }),
        Err(e) => store_error(e),
    }
}

pub async fn mark_all_read<C: Context>(ctx: &C, identity: &IdentityRef) -> ServiceResult<u64> {
    match notifications::mark_all_read(ctx, identity.kind.as_str(), &identity.id).await {
        Ok(count) => {
            info!(identity = %identity, count, "Marked all notifications read");
            Ok(count)
        }
        Err(e) => store_error(e),
    }
}
