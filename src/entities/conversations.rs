#[derive(Debug, sqlx::FromRow)]
pub struct Conversation {
    pub id: String,
    pub participant_a_kind: String,
    pub participant_a_id: String,
    pub participant_a_last_seen_at: Option<i64>,
    pub participant_b_kind: String,
    pub participant_b_id: String,
    pub participant_b_last_seen_at: Option<i64>,
    pub product_id: Option<String>,
    pub last_message_id: Option<String>,
    pub last_activity_at: i64,
    pub message_seq: i64,
    pub active: i64,
    pub created_at: i64,
}

pub struct CreateConversationArgs {
    pub participant_a_kind: &'static str,
    pub participant_a_id: String,
    pub participant_b_kind: &'static str,
    pub participant_b_id: String,
    pub active_pair_key: String,
    pub product_id: Option<String>,
}
