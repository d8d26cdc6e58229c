use crate::common::context::Context;
use crate::common::time::now_millis;
use crate::entities::notifications::{CreateNotificationArgs, Notification};
use uuid::Uuid;

const TABLE_NAME: &str = "notifications";
const READ_FIELDS: &str = const_str::concat!(
    "id, recipient_kind, recipient_id, sender_kind, sender_id, related_message_id, ",
    "related_conversation_id, title, body, is_read, read_at, created_at"
);

pub async fn fetch_one<C: Context>(
    ctx: &C,
    notification_id: &str,
) -> sqlx::Result<Option<Notification>> {
    const QUERY: &str =
        const_str::concat!("SELECT ", READ_FIELDS, " FROM ", TABLE_NAME, " WHERE id = ?");
    sqlx::query_as(QUERY)
        .bind(notification_id)
        .fetch_optional(ctx.db())
        .await
}

pub async fn fetch_one_by_message<C: Context>(
    ctx: &C,
    related_message_id: &str,
) -> sqlx::Result<Option<Notification>> {
    const QUERY: &str = const_str::concat!(
        "SELECT ",
        READ_FIELDS,
        " FROM ",
        TABLE_NAME,
        " WHERE related_message_id = ?"
    );
    sqlx::query_as(QUERY)
        .bind(related_message_id)
        .fetch_optional(ctx.db())
        .await
}

/// Fails with a unique violation when the message already has one.
pub async fn create<C: Context>(
    ctx: &C,
    args: CreateNotificationArgs<'_>,
) -> sqlx::Result<Notification> {
    const QUERY: &str = const_str::concat!(
        "INSERT INTO ",
        TABLE_NAME,
        " (id, recipient_kind, recipient_id, sender_kind, sender_id, related_message_id, ",
        "related_conversation_id, title, body, is_read, created_at) ",
        "VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)"
    );
    let notification_id = Uuid::new_v4().to_string();
    let created_at = now_millis();
    sqlx::query(QUERY)
        .bind(&notification_id)
        .bind(args.recipient_kind)
        .bind(args.recipient_id)
        .bind(args.sender_kind)
        .bind(args.sender_id)
        .bind(args.related_message_id)
        .bind(args.related_conversation_id)
        .bind(args.title)
        .bind(args.body)
        .bind(created_at)
        .execute(ctx.db())
        .await?;
    Ok(Notification {
        id: notification_id,
        recipient_kind: args.recipient_kind.to_owned(),
        recipient_id: args.recipient_id.to_owned(),
        sender_kind: args.sender_kind.to_owned(),
        sender_id: args.sender_id.to_owned(),
        related_message_id: args.related_message_id.to_owned(),
        related_conversation_id: args.related_conversation_id.to_owned(),
        title: args.title.to_owned(),
        body: args.body.to_owned(),
        is_read: 0,
        read_at: None,
        created_at,
    })
}

pub async fn fetch_page<C: Context>(
    ctx: &C,
    recipient_kind: &str,
    recipient_id: &str,
    limit: u32,
    offset: u32,
) -> sqlx::Result<Vec<Notification>> {
    const QUERY: &str = const_str::concat!(
        "SELECT ",
        READ_FIELDS,
        " FROM ",
        TABLE_NAME,
        " WHERE recipient_kind = ? AND recipient_id = ? ",
        "ORDER BY created_at DESC, id ASC LIMIT ? OFFSET ?"
    );
    sqlx::query_as(QUERY)
        .bind(recipient_kind)
        .bind(recipient_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(ctx.db())
        .await
}

pub async fn unread_count<C: Context>(
    ctx: &C,
    recipient_kind: &str,
    recipient_id: &str,
) -> sqlx::Result<i64> {
    const QUERY: &str = const_str::concat!(
        "SELECT COUNT(*) FROM ",
        TABLE_NAME,
        " WHERE recipient_kind = ? AND recipient_id = ? AND is_read = 0"
    );
    sqlx::query_scalar(QUERY)
        .bind(recipient_kind)
        .bind(recipient_id)
        .fetch_one(ctx.db())
        .await
}

pub async fn mark_read<C: Context>(
    ctx: &C,
    notification_id: &str,
    read_at: i64,
) -> sqlx::Result<u64> {
    const QUERY: &str = const_str::concat!(
        "UPDATE ",
        TABLE_NAME,
        " SET is_read = 1, read_at = ? WHERE id = ? AND is_read = 0"
    );
    let result = sqlx::query(QUERY)
        .bind(read_at)
        .bind(notification_id)
        .execute(ctx.db())
        .await?;
    Ok(result.rows_affected())
}

pub async fn mark_all_read<C: Context>(
    ctx: &C,
    recipient_kind: &str,
    recipient_id: &str,
) -> sqlx::Result<u64> {
    const QUERY: &str = const_str::concat!(
        "UPDATE ",
        TABLE_NAME,
        " SET is_read = 1, read_at = ? ",
        "WHERE recipient_kind = ? AND recipient_id = ? AND is_read = 0"
    );
    let result = sqlx::query(QUERY)
        .bind(now_millis())
        .bind(recipient_kind)
        .bind(recipient_id)
        .execute(ctx.db())
        .await?;
    Ok(result.rows_affected())
}
