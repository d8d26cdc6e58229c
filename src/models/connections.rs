use crate::common::error::{AppError, ServiceResult};
use crate::models::identities::IdentityRef;
use uuid::Uuid;

/// Per-connection state owned by the connection's reader task.
#[derive(Debug, Clone)]
pub struct Connection {
    pub connection_id: Uuid,
    pub identity: Option<IdentityRef>,
}

impl Connection {
    pub fn new() -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            identity: None,
        }
    }

    pub fn identity(&self) -> ServiceResult<&IdentityRef> {
        self.identity.as_ref().ok_or(AppError::GatewayNotIdentified)
    }

    /// Only the bound identity may act on its own behalf.
    pub fn ensure_identity(&self, identity: &IdentityRef) -> ServiceResult<&IdentityRef> {
        let bound = self.identity()?;
        if bound != identity {
            return Err(AppError::GatewayIdentityMismatch);
        }
        Ok(bound)
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}
