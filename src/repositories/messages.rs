use crate::common::context::Context;
use crate::common::time::now_millis;
use crate::entities::messages::{AppendMessageArgs, Message};
use uuid::Uuid;

const TABLE_NAME: &str = "messages";
const READ_FIELDS: &str = const_str::concat!(
    "id, conversation_id, seq, sender_kind, sender_id, receiver_kind, receiver_id, ",
    "body, kind, is_read, read_at, deleted_at, created_at"
);

/// Appends a message in one transaction. Bumping the conversation's
/// sequence counter takes the row lock that serializes concurrent appends.
/// Returns `None` when the conversation is unknown or inactive.
pub async fn append<C: Context>(
    ctx: &C,
    args: AppendMessageArgs<'_>,
) -> sqlx::Result<Option<Message>> {
    const ADVANCE_SEQ: &str = const_str::concat!(
        "UPDATE conversations SET message_seq = message_seq + 1 ",
        "WHERE id = ? AND active = 1"
    );
    const READ_SEQ: &str =
        "SELECT message_seq, last_activity_at FROM conversations WHERE id = ?";
    const INSERT: &str = const_str::concat!(
        "INSERT INTO ",
        TABLE_NAME,
        " (id, conversation_id, seq, sender_kind, sender_id, receiver_kind, receiver_id, ",
        "body, kind, is_read, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)"
    );
    const ADVANCE_POINTER: &str = const_str::concat!(
        "UPDATE conversations SET last_message_id = ?, last_activity_at = ? ",
        "WHERE id = ?"
    );

    let mut tx = ctx.db().begin().await?;
    let advanced = sqlx::query(ADVANCE_SEQ)
        .bind(args.conversation_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if advanced == 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    let (seq, last_activity_at): (i64, i64) = sqlx::query_as(READ_SEQ)
        .bind(args.conversation_id)
        .fetch_one(&mut *tx)
        .await?;
    let created_at = now_millis().max(last_activity_at + 1);
    let message_id = Uuid::new_v4().to_string();

    sqlx::query(INSERT)
        .bind(&message_id)
        .bind(args.conversation_id)
        .bind(seq)
        .bind(args.sender_kind)
        .bind(args.sender_id)
        .bind(args.receiver_kind)
        .bind(args.receiver_id)
        .bind(args.body)
        .bind(args.kind)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;
    sqlx::query(ADVANCE_POINTER)
        .bind(&message_id)
        .bind(created_at)
        .bind(args.conversation_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(Some(Message {
        id: message_id,
        conversation_id: args.conversation_id.to_owned(),
        seq,
        sender_kind: args.sender_kind.to_owned(),
        sender_id: args.sender_id.to_owned(),
        receiver_kind: args.receiver_kind.to_owned(),
        receiver_id: args.receiver_id.to_owned(),
        body: args.body.to_owned(),
        kind: args.kind.to_owned(),
        is_read: 0,
        read_at: None,
        deleted_at: None,
        created_at,
    }))
}

pub async fn fetch_one<C: Context>(ctx: &C, message_id: &str) -> sqlx::Result<Option<Message>> {
    const QUERY: &str =
        const_str::concat!("SELECT ", READ_FIELDS, " FROM ", TABLE_NAME, " WHERE id = ?");
    sqlx::query_as(QUERY)
        .bind(message_id)
        .fetch_optional(ctx.db())
        .await
}

/// Newest first, strictly older than `before_seq` when given.
pub async fn fetch_page<C: Context>(
    ctx: &C,
    conversation_id: &str,
    before_seq: Option<i64>,
    limit: u32,
) -> sqlx::Result<Vec<Message>> {
    const QUERY: &str = const_str::concat!(
        "SELECT ",
        READ_FIELDS,
        " FROM ",
        TABLE_NAME,
        " WHERE conversation_id = ? AND deleted_at IS NULL AND seq < ? ",
        "ORDER BY seq DESC LIMIT ?"
    );
    sqlx::query_as(QUERY)
        .bind(conversation_id)
        .bind(before_seq.unwrap_or(i64::MAX))
        .bind(limit as i64)
        .fetch_all(ctx.db())
        .await
}

pub async fn mark_read<C: Context>(
    ctx: &C,
    conversation_id: &str,
    receiver_kind: &str,
    receiver_id: &str,
    read_at: i64,
) -> sqlx::Result<u64> {
    const QUERY: &str = const_str::concat!(
        "UPDATE ",
        TABLE_NAME,
        " SET is_read = 1, read_at = ? ",
        "WHERE conversation_id = ? AND receiver_kind = ? AND receiver_id = ? AND is_read = 0"
    );
    let result = sqlx::query(QUERY)
        .bind(read_at)
        .bind(conversation_id)
        .bind(receiver_kind)
        .bind(receiver_id)
        .execute(ctx.db())
        .await?;
    Ok(result.rows_affected())
}

pub async fn soft_delete<C: Context>(ctx: &C, message_id: &str) -> sqlx::Result<u64> {
    const QUERY: &str = const_str::concat!(
        "UPDATE ",
        TABLE_NAME,
        " SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL"
    );
    let result = sqlx::query(QUERY)
        .bind(now_millis())
        .bind(message_id)
        .execute(ctx.db())
        .await?;
    Ok(result.rows_affected())
}

pub async fn count_sent_since<C: Context>(
    ctx: &C,
    sender_kind: &str,
    sender_id: &str,
    since: i64,
) -> sqlx::Result<i64> {
    const QUERY: &str = const_str::concat!(
        "SELECT COUNT(*) FROM ",
        TABLE_NAME,
        " WHERE sender_kind = ? AND sender_id = ? AND created_at >= ?"
    );
    sqlx::query_scalar(QUERY)
        .bind(sender_kind)
        .bind(sender_id)
        .bind(since)
        .fetch_one(ctx.db())
        .await
}
