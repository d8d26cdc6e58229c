use crate::api::RequestContext;
use crate::common::error::ServiceResponse;
use crate::models::api::DeletedConversationsResponse;
use crate::models::identities::{IdentityKind, IdentityRef};
use crate::usecases::conversations;
use axum::Json;
use axum::extract::Path;

/// Account-deletion hook called by the marketplace.
pub async fn delete(
    ctx: RequestContext,
    Path((kind, id)): Path<(IdentityKind, String)>,
) -> ServiceResponse<DeletedConversationsResponse> {
    let identity = IdentityRef::new(kind, id);
    let deleted = conversations::delete_for_identity(&ctx, &identity).await?;
    Ok(Json(deleted))
}
