use crate::api::RequestContext;
use crate::common::error::ServiceResponse;
use crate::models::api::{IdentityQuery, IsOnlineResponse, OnlineUsersResponse};
use crate::usecases::presences;
use axum::Json;
use axum::extract::Query;

pub async fn is_online(
    ctx: RequestContext,
    Query(args): Query<IdentityQuery>,
) -> ServiceResponse<IsOnlineResponse> {
    let identity = args.into_identity()?;
    let online = presences::is_online(&ctx, &identity);
    Ok(Json(IsOnlineResponse { identity, online }))
}

pub async fn online_users(ctx: RequestContext) -> ServiceResponse<OnlineUsersResponse> {
    Ok(Json(OnlineUsersResponse {
        count: presences::online_count(&ctx),
    }))
}
