#[derive(Debug, sqlx::FromRow)]
pub struct Notification {
    pub id: String,
    pub recipient_kind: String,
    pub recipient_id: String,
    pub sender_kind: String,
    pub sender_id: String,
    pub related_message_id: String,
    pub related_conversation_id: String,
    pub title: String,
    pub body: String,
    pub is_read: i64,
    pub read_at: Option<i64>,
    pub created_at: i64,
}

pub struct CreateNotificationArgs<'a> {
    pub recipient_kind: &'static str,
    pub recipient_id: &'a str,
    pub sender_kind: &'static str,
    pub sender_id: &'a str,
    pub related_message_id: &'a str,
    pub related_conversation_id: &'a str,
    pub title: &'a str,
    pub body: &'a str,
}
