use crate::common::error::AppError;
use crate::common::time::from_millis;
use crate::entities::notifications::Notification as Entity;
use crate::models::identities::IdentityRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub recipient: IdentityRef,
    pub sender: IdentityRef,
    pub related_message_id: Uuid,
    pub related_conversation_id: Uuid,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<Entity> for Notification {
    type Error = AppError;

    fn try_from(value: Entity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::from_str(&value.id)?,
            recipient: IdentityRef::from_parts(&value.recipient_kind, value.recipient_id)?,
            sender: IdentityRef::from_parts(&value.sender_kind, value.sender_id)?,
            related_message_id: Uuid::from_str(&value.related_message_id)?,
            related_conversation_id: Uuid::from_str(&value.related_conversation_id)?,
            title: value.title,
            body: value.body,
            is_read: value.is_read != 0,
            read_at: value.read_at.map(from_millis),
            created_at: from_millis(value.created_at),
        })
    }
}
