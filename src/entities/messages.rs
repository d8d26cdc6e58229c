#[derive(Debug, sqlx::FromRow)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub seq: i64,
    pub sender_kind: String,
    pub sender_id: String,
    pub receiver_kind: String,
    pub receiver_id: String,
    pub body: String,
    pub kind: String,
    pub is_read: i64,
    pub read_at: Option<i64>,
    pub deleted_at: Option<i64>,
    pub created_at: i64,
}

pub struct AppendMessageArgs<'a> {
    pub conversation_id: &'a str,
    pub sender_kind: &'static str,
    pub sender_id: &'a str,
    pub receiver_kind: &'static str,
    pub receiver_id: &'a str,
    pub body: &'a str,
    pub kind: &'static str,
}
