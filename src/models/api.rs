use crate::common::error::ServiceResult;
use crate::models::identities::{IdentityKind, IdentityRef};
use serde::{Deserialize, Serialize};

/// `?kind=customer&id=...`, how the request surface names the caller.
#[derive(Debug, Deserialize)]
pub struct IdentityQuery {
    pub kind: IdentityKind,
    pub id: String,
}

impl IdentityQuery {
    pub fn into_identity(self) -> ServiceResult<IdentityRef> {
        let identity = IdentityRef::new(self.kind, self.id);
        identity.validate()?;
        Ok(identity)
    }
}

#[derive(Debug, Deserialize)]
pub struct PagedIdentityQuery {
    pub kind: IdentityKind,
    pub id: String,
    #[serde(default)]
    pub page: u32,
}

impl PagedIdentityQuery {
    pub fn into_parts(self) -> ServiceResult<(IdentityRef, u32)> {
        let identity = IdentityRef::new(self.kind, self.id);
        identity.validate()?;
        Ok((identity, self.page))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePageQuery {
    pub kind: IdentityKind,
    pub id: String,
    pub page_token: Option<String>,
}

impl MessagePageQuery {
    pub fn into_parts(self) -> ServiceResult<(IdentityRef, Option<String>)> {
        let identity = IdentityRef::new(self.kind, self.id);
        identity.validate()?;
        Ok((identity, self.page_token))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FindOrCreateConversationRequest {
    pub identity: IdentityRef,
    pub other: IdentityRef,
    pub product_id: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsOnlineResponse {
    pub identity: IdentityRef,
    pub online: bool,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUsersResponse {
    pub count: usize,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedConversationsResponse {
    pub conversations: u64,
    pub messages: u64,
    pub notifications: u64,
}
