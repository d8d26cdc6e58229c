use crate::common::error::AppError;
use crate::common::time::from_millis;
use crate::entities::messages::Message as MessageEntity;
use crate::models::identities::IdentityRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    File,
}

impl MessageKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::File => "file",
        }
    }
}

impl FromStr for MessageKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageKind::Text),
            "image" => Ok(MessageKind::Image),
            "file" => Ok(MessageKind::File),
            _ => Err(AppError::MessagesUnsupportedKind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub seq: i64,
    pub sender: IdentityRef,
    pub receiver: IdentityRef,
    pub body: String,
    pub kind: MessageKind,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    /// Oldest first.
    pub messages: Vec<Message>,
    /// Points at the next older page, absent on the oldest one.
    pub next_page_token: Option<String>,
}

impl TryFrom<MessageEntity> for Message {
    type Error = AppError;

    fn try_from(value: MessageEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::from_str(&value.id)?,
            conversation_id: Uuid::from_str(&value.conversation_id)?,
            seq: value.seq,
            sender: IdentityRef::from_parts(&value.sender_kind, value.sender_id)?,
            receiver: IdentityRef::from_parts(&value.receiver_kind, value.receiver_id)?,
            body: value.body,
            kind: MessageKind::from_str(&value.kind)?,
            is_read: value.is_read != 0,
            read_at: value.read_at.map(from_millis),
            created_at: from_millis(value.created_at),
        })
    }
}
