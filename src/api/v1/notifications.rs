use crate::api::RequestContext;
use crate::common::error::ServiceResponse;
use crate::models::api::{CountResponse, IdentityQuery, PagedIdentityQuery};
use crate::models::notifications::Notification;
use crate::usecases::notifications;
use axum::Json;
use axum::extract::{Path, Query};
use uuid::Uuid;

pub async fn list(
    ctx: RequestContext,
    Query(args): Query<PagedIdentityQuery>,
) -> ServiceResponse<Vec<Notification>> {
    let (identity, page) = args.into_parts()?;
    let notifications = notifications::list(&ctx, &identity, page).await?;
    Ok(Json(notifications))
}

pub async fn unread_count(
    ctx: RequestContext,
    Query(args): Query<IdentityQuery>,
) -> ServiceResponse<CountResponse> {
    let identity = args.into_identity()?;
    let count = notifications::unread_count(&ctx, &identity).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn mark_read(
    ctx: RequestContext,
    Path(notification_id): Path<Uuid>,
    Query(args): Query<IdentityQuery>,
) -> ServiceResponse<Notification> {
    let identity = args.into_identity()?;
    let notification = notifications::mark_read(&ctx, notification_id, &identity).await?;
    Ok(Json(notification))
}

pub async fn mark_all_read(
    ctx: RequestContext,
    Query(args): Query<IdentityQuery>,
) -> ServiceResponse<CountResponse> {
    let identity = args.into_identity()?;
    let count = notifications::mark_all_read(&ctx, &identity).await?;
    Ok(Json(CountResponse { count }))
}
