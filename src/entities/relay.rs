use crate::models::gateway::ServerEvent;
use crate::repositories::streams::StreamName;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A channel publish forwarded to the other instances.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayEnvelope {
    pub origin: Uuid,
    pub stream: StreamName,
    pub event: ServerEvent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<Uuid>,
}
