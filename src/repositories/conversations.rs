use crate::common::context::Context;
use crate::common::time::now_millis;
use crate::entities::conversations::{Conversation, CreateConversationArgs};
use uuid::Uuid;

const TABLE_NAME: &str = "conversations";
const READ_FIELDS: &str = const_str::concat!(
    "id, participant_a_kind, participant_a_id, participant_a_last_seen_at, ",
    "participant_b_kind, participant_b_id, participant_b_last_seen_at, ",
    "product_id, last_message_id, last_activity_at, message_seq, active, created_at"
);
const PARTICIPANT_FILTER: &str = const_str::concat!(
    "((participant_a_kind = ? AND participant_a_id = ?) ",
    "OR (participant_b_kind = ? AND participant_b_id = ?))"
);

pub async fn fetch_one<C: Context>(
    ctx: &C,
    conversation_id: &str,
) -> sqlx::Result<Option<Conversation>> {
    const QUERY: &str =
        const_str::concat!("SELECT ", READ_FIELDS, " FROM ", TABLE_NAME, " WHERE id = ?");
    sqlx::query_as(QUERY)
        .bind(conversation_id)
        .fetch_optional(ctx.db())
        .await
}

pub async fn fetch_active_by_pair<C: Context>(
    ctx: &C,
    active_pair_key: &str,
) -> sqlx::Result<Option<Conversation>> {
    const QUERY: &str = const_str::concat!(
        "SELECT ",
        READ_FIELDS,
        " FROM ",
        TABLE_NAME,
        " WHERE active_pair_key = ? AND active = 1"
    );
    sqlx::query_as(QUERY)
        .bind(active_pair_key)
        .fetch_optional(ctx.db())
        .await
}

/// Fails with a unique violation when another active conversation already
/// holds `active_pair_key`.
pub async fn create<C: Context>(
    ctx: &C,
    args: CreateConversationArgs,
) -> sqlx::Result<Conversation> {
    const QUERY: &str = const_str::concat!(
        "INSERT INTO ",
        TABLE_NAME,
        " (id, participant_a_kind, participant_a_id, participant_b_kind, participant_b_id, ",
        "active_pair_key, product_id, last_activity_at, message_seq, active, created_at) ",
        "VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, 1, ?)"
    );
    let conversation_id = Uuid::new_v4().to_string();
    let now = now_millis();
    sqlx::query(QUERY)
        .bind(&conversation_id)
        .bind(args.participant_a_kind)
        .bind(&args.participant_a_id)
        .bind(args.participant_b_kind)
        .bind(&args.participant_b_id)
        .bind(&args.active_pair_key)
        .bind(&args.product_id)
        .bind(now)
        .bind(now)
        .execute(ctx.db())
        .await?;
    Ok(Conversation {
        id: conversation_id,
        participant_a_kind: args.participant_a_kind.to_owned(),
        participant_a_id: args.participant_a_id,
        participant_a_last_seen_at: None,
        participant_b_kind: args.participant_b_kind.to_owned(),
        participant_b_id: args.participant_b_id,
        participant_b_last_seen_at: None,
        product_id: args.product_id,
        last_message_id: None,
        last_activity_at: now,
        message_seq: 0,
        active: 1,
        created_at: now,
    })
}

pub async fn fetch_many_by_participant<C: Context>(
    ctx: &C,
    kind: &str,
    id: &str,
    limit: u32,
    offset: u32,
) -> sqlx::Result<Vec<Conversation>> {
    const QUERY: &str = const_str::concat!(
        "SELECT ",
        READ_FIELDS,
        " FROM ",
        TABLE_NAME,
        " WHERE active = 1 AND ",
        PARTICIPANT_FILTER,
        " ORDER BY last_activity_at DESC, id ASC LIMIT ? OFFSET ?"
    );
    sqlx::query_as(QUERY)
        .bind(kind)
        .bind(id)
        .bind(kind)
        .bind(id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(ctx.db())
        .await
}

pub async fn touch_last_seen<C: Context>(
    ctx: &C,
    conversation_id: &str,
    kind: &str,
    id: &str,
) -> sqlx::Result<u64> {
    const QUERY: &str = const_str::concat!(
        "UPDATE ",
        TABLE_NAME,
        " SET participant_a_last_seen_at = CASE ",
        "WHEN participant_a_kind = ? AND participant_a_id = ? THEN ? ",
        "ELSE participant_a_last_seen_at END, ",
        "participant_b_last_seen_at = CASE ",
        "WHEN participant_b_kind = ? AND participant_b_id = ? THEN ? ",
        "ELSE participant_b_last_seen_at END ",
        "WHERE id = ?"
    );
    let now = now_millis();
    let result = sqlx::query(QUERY)
        .bind(kind)
        .bind(id)
        .bind(now)
        .bind(kind)
        .bind(id)
        .bind(now)
        .bind(conversation_id)
        .execute(ctx.db())
        .await?;
    Ok(result.rows_affected())
}

/// Releases the pair key so the same two identities may start over.
pub async fn deactivate<C: Context>(ctx: &C, conversation_id: &str) -> sqlx::Result<u64> {
    const QUERY: &str = const_str::concat!(
        "UPDATE ",
        TABLE_NAME,
        " SET active = 0, active_pair_key = NULL WHERE id = ? AND active = 1"
    );
    let result = sqlx::query(QUERY)
        .bind(conversation_id)
        .execute(ctx.db())
        .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_ids_by_participant<C: Context>(
    ctx: &C,
    kind: &str,
    id: &str,
) -> sqlx::Result<Vec<String>> {
    const QUERY: &str = const_str::concat!(
        "SELECT id FROM ",
        TABLE_NAME,
        " WHERE ",
        PARTICIPANT_FILTER
    );
    sqlx::query_scalar(QUERY)
        .bind(kind)
        .bind(id)
        .bind(kind)
        .bind(id)
        .fetch_all(ctx.db())
        .await
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeletedRows {
    pub conversations: u64,
    pub messages: u64,
    pub notifications: u64,
}

/// Physically removes the conversations together with their messages and
/// notifications, all or nothing.
pub async fn delete_many<C: Context>(
    ctx: &C,
    conversation_ids: &[String],
) -> sqlx::Result<DeletedRows> {
    const DELETE_NOTIFICATIONS: &str =
        "DELETE FROM notifications WHERE related_conversation_id = ?";
    const DELETE_MESSAGES: &str = "DELETE FROM messages WHERE conversation_id = ?";
    const DELETE_CONVERSATION: &str =
        const_str::concat!("DELETE FROM ", TABLE_NAME, " WHERE id = ?");

    let mut deleted = DeletedRows::default();
    let mut tx = ctx.db().begin().await?;
    for conversation_id in conversation_ids {
        deleted.notifications += sqlx::query(DELETE_NOTIFICATIONS)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        deleted.messages += sqlx::query(DELETE_MESSAGES)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        deleted.conversations += sqlx::query(DELETE_CONVERSATION)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }
    tx.commit().await?;
    Ok(deleted)
}
