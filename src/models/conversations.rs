use crate::common::error::AppError;
use crate::common::time::from_millis;
use crate::entities::conversations::Conversation as Entity;
use crate::models::identities::IdentityRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub identity: IdentityRef,
    pub last_seen_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub participants: [Participant; 2],
    pub product_id: Option<String>,
    pub last_message_id: Option<Uuid>,
    pub last_activity_at: DateTime<Utc>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_participant(&self, identity: &IdentityRef) -> bool {
        self.participants
            .iter()
            .any(|participant| &participant.identity == identity)
    }

    /// The other participant, if `identity` takes part in this conversation.
    pub fn counterpart(&self, identity: &IdentityRef) -> Option<&IdentityRef> {
        match &self.participants {
            [a, b] if &a.identity == identity => Some(&b.identity),
            [a, b] if &b.identity == identity => Some(&a.identity),
            _ => None,
        }
    }
}

/// Order-independent key for a pair of identities. At most one active
/// conversation may hold a given key.
pub fn pair_key(a: &IdentityRef, b: &IdentityRef) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("{first}|{second}")
}

impl TryFrom<Entity> for Conversation {
    type Error = AppError;

    fn try_from(value: Entity) -> Result<Self, Self::Error> {
        let participant_a = Participant {
            identity: IdentityRef::from_parts(&value.participant_a_kind, value.participant_a_id)?,
            last_seen_at: value.participant_a_last_seen_at.map(from_millis),
        };
        let participant_b = Participant {
            identity: IdentityRef::from_parts(&value.participant_b_kind, value.participant_b_id)?,
            last_seen_at: value.participant_b_last_seen_at.map(from_millis),
        };
        let last_message_id = match value.last_message_id {
            Some(message_id) => Some(Uuid::from_str(&message_id)?),
            None => None,
        };
        Ok(Self {
            id: Uuid::from_str(&value.id)?,
            participants: [participant_a, participant_b],
            product_id: value.product_id,
            last_message_id,
            last_activity_at: from_millis(value.last_activity_at),
            active: value.active != 0,
            created_at: from_millis(value.created_at),
        })
    }
}
