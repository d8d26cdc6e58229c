use crate::common::error::AppError;
use crate::models::identities::IdentityRef;
use crate::models::messages::{Message, MessageKind};
use crate::models::notifications::Notification;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events accepted over the persistent connection, framed as
/// `{"event": "<name>", "data": {...}}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinUserChannel(JoinUserChannel),
    JoinConversation(ConversationArgs),
    LeaveConversation(ConversationArgs),
    SendMessage(SendMessage),
    Typing(ConversationArgs),
    StopTyping(ConversationArgs),
    MarkRead(MarkRead),
}

impl ClientEvent {
    pub const fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinUserChannel(_) => "join-user-channel",
            ClientEvent::JoinConversation(_) => "join-conversation",
            ClientEvent::LeaveConversation(_) => "leave-conversation",
            ClientEvent::SendMessage(_) => "send-message",
            ClientEvent::Typing(_) => "typing",
            ClientEvent::StopTyping(_) => "stop-typing",
            ClientEvent::MarkRead(_) => "mark-read",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JoinUserChannel {
    pub identity: IdentityRef,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConversationArgs {
    pub conversation_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SendMessage {
    pub conversation_id: Uuid,
    pub receiver: IdentityRef,
    pub body: String,
    pub client_temp_id: String,
    #[serde(default)]
    pub kind: MessageKind,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MarkRead {
    pub conversation_id: Uuid,
    pub identity: IdentityRef,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    UserChannelJoined {
        identity: IdentityRef,
        display_name: String,
        unread_notifications: u64,
    },
    ConversationJoined {
        conversation_id: Uuid,
    },
    ConversationLeft {
        conversation_id: Uuid,
    },
    MessageDelivered(Message),
    MessageAck {
        client_temp_id: String,
        message: Message,
    },
    MessageError {
        client_temp_id: String,
        code: String,
        reason: String,
        retryable: bool,
    },
    Typing {
        conversation_id: Uuid,
        identity: IdentityRef,
    },
    StopTyping {
        conversation_id: Uuid,
        identity: IdentityRef,
    },
    ReadReceipt {
        conversation_id: Uuid,
        reader: IdentityRef,
        count: u64,
        read_at: DateTime<Utc>,
    },
    MessageDeleted {
        conversation_id: Uuid,
        message_id: Uuid,
    },
    NotificationCreated(Notification),
    Error {
        code: String,
        message: String,
    },
}

impl ServerEvent {
    pub fn error(e: &AppError) -> Self {
        ServerEvent::Error {
            code: e.code().to_owned(),
            message: e.message().to_owned(),
        }
    }

    pub fn message_error(client_temp_id: String, e: &AppError) -> Self {
        ServerEvent::MessageError {
            client_temp_id,
            code: e.code().to_owned(),
            reason: e.message().to_owned(),
            retryable: e.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_send_message_frame() {
        let conversation_id = Uuid::new_v4();
        let frame = json!({
            "event": "send-message",
            "data": {
                "conversationId": conversation_id,
                "receiver": {"kind": "seller", "id": "s-1"},
                "body": "hello",
                "clientTempId": "tmp-1"
            }
        });
        let event: ClientEvent = serde_json::from_value(frame).unwrap();
        match event {
            ClientEvent::SendMessage(args) => {
                assert_eq!(args.conversation_id, conversation_id);
                assert_eq!(args.receiver, IdentityRef::seller("s-1"));
                assert_eq!(args.kind, MessageKind::Text);
                assert_eq!(args.client_temp_id, "tmp-1");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_payload_fields() {
        let frame = json!({
            "event": "join-conversation",
            "data": {"conversationId": Uuid::new_v4(), "admin": true}
        });
        assert!(serde_json::from_value::<ClientEvent>(frame).is_err());
    }

    #[test]
    fn rejects_unknown_events() {
        let frame = json!({"event": "delete-everything", "data": {}});
        assert!(serde_json::from_value::<ClientEvent>(frame).is_err());
    }

    #[test]
    fn encodes_message_error_with_temp_id() {
        let event = ServerEvent::message_error("tmp-9".to_owned(), &AppError::MessagesInvalidLength);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "message-error");
        assert_eq!(value["data"]["clientTempId"], "tmp-9");
        assert_eq!(value["data"]["code"], "messages.invalid_length");
        assert_eq!(value["data"]["retryable"], false);
    }
}
