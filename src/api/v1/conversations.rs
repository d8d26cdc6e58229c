use crate::api::RequestContext;
use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResponse};
use crate::models::api::{
    FindOrCreateConversationRequest, IdentityQuery, MessagePageQuery, PagedIdentityQuery,
};
use crate::models::conversations::Conversation;
use crate::models::messages::MessagePage;
use crate::usecases::{conversations, messages};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query};
use uuid::Uuid;

pub async fn find_or_create(
    ctx: RequestContext,
    payload: Result<Json<FindOrCreateConversationRequest>, JsonRejection>,
) -> ServiceResponse<Conversation> {
    let Json(args) = payload.map_err(|_| AppError::DecodingRequestFailed)?;
    args.identity.validate()?;
    args.other.validate()?;
    ctx.identities().resolve_identity(&args.identity).await?;
    ctx.identities().resolve_identity(&args.other).await?;
    if let Some(product_id) = &args.product_id {
        ctx.products().resolve_product(product_id).await?;
    }
    let conversation =
        conversations::find_or_create(&ctx, &args.identity, &args.other, args.product_id).await?;
    Ok(Json(conversation))
}

pub async fn list(
    ctx: RequestContext,
    Query(args): Query<PagedIdentityQuery>,
) -> ServiceResponse<Vec<Conversation>> {
    let (identity, page) = args.into_parts()?;
    let conversations = conversations::list_for_identity(&ctx, &identity, page).await?;
    Ok(Json(conversations))
}

pub async fn deactivate(
    ctx: RequestContext,
    Path(conversation_id): Path<Uuid>,
    Query(args): Query<IdentityQuery>,
) -> ServiceResponse<Conversation> {
    let identity = args.into_identity()?;
    let conversation = conversations::deactivate(&ctx, conversation_id, &identity).await?;
    Ok(Json(conversation))
}

pub async fn messages(
    ctx: RequestContext,
    Path(conversation_id): Path<Uuid>,
    Query(args): Query<MessagePageQuery>,
) -> ServiceResponse<MessagePage> {
    let (identity, page_token) = args.into_parts()?;
    conversations::fetch_for_participant(&ctx, conversation_id, &identity).await?;
    let page = messages::list_page(&ctx, conversation_id, page_token.as_deref()).await?;
    Ok(Json(page))
}
