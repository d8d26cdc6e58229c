use crate::api::RequestContext;
use crate::common::error::ServiceResult;
use crate::models::api::IdentityQuery;
use crate::usecases::messages;
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use uuid::Uuid;

pub async fn delete(
    ctx: RequestContext,
    Path(message_id): Path<Uuid>,
    Query(args): Query<IdentityQuery>,
) -> ServiceResult<StatusCode> {
    let identity = args.into_identity()?;
    messages::delete(&ctx, message_id, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}
