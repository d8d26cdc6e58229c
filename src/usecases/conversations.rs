use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, is_unique_violation, store_error};
use crate::entities::conversations::CreateConversationArgs;
use crate::models::api::DeletedConversationsResponse;
use crate::models::conversations::{Conversation, pair_key};
use crate::models::identities::IdentityRef;
use crate::repositories::conversations;
use tracing::{info, warn};
use uuid::Uuid;

pub const CONVERSATIONS_PER_PAGE: u32 = 20;
const FIND_OR_CREATE_ATTEMPTS: usize = 3;

/// Returns the active conversation between the two identities, creating it
/// when none exists. Concurrent callers for the same pair all observe the
/// same conversation.
pub async fn find_or_create<C: Context>(
    ctx: &C,
    identity: &IdentityRef,
    other: &IdentityRef,
    product_id: Option<String>,
) -> ServiceResult<Conversation> {
    identity.validate()?;
    other.validate()?;
    if identity == other {
        return Err(AppError::ConversationsSelfConversation);
    }

    let active_pair_key = pair_key(identity, other);
    for _ in 0..FIND_OR_CREATE_ATTEMPTS {
        match conversations::fetch_active_by_pair(ctx, &active_pair_key).await {
            Ok(Some(conversation)) => return Conversation::try_from(conversation),
            Ok(None) => {}
            Err(e) => return store_error(e),
        }

        let args = CreateConversationArgs {
            participant_a_kind: identity.kind.as_str(),
            participant_a_id: identity.id.clone(),
            participant_b_kind: other.kind.as_str(),
            participant_b_id: other.id.clone(),
            active_pair_key: active_pair_key.clone(),
            product_id: product_id.clone(),
        };
        match conversations::create(ctx, args).await {
            Ok(conversation) => {
                info!(
                    conversation_id = %conversation.id,
                    pair = %active_pair_key,
                    "Conversation created"
                );
                return Conversation::try_from(conversation);
            }
            // lost the race, the winner's row is read on the next attempt
            Err(e) if is_unique_violation(&e) => continue,
            Err(e) => return store_error(e),
        }
    }

    warn!(pair = %active_pair_key, "Conversation kept changing under find-or-create");
    Err(AppError::ConversationsConflict)
}

pub async fn fetch_one<C: Context>(ctx: &C, conversation_id: Uuid) -> ServiceResult<Conversation> {
    match conversations::fetch_one(ctx, &conversation_id.to_string()).await {
        Ok(Some(conversation)) => Conversation::try_from(conversation),
        Ok(None) => Err(AppError::ConversationsNotFound),
        Err(e) => store_error(e),
    }
}

/// Fetches the conversation on behalf of one of its participants.
pub async fn fetch_for_participant<C: Context>(
    ctx: &C,
    conversation_id: Uuid,
    identity: &IdentityRef,
) -> ServiceResult<Conversation> {
    let conversation = fetch_one(ctx, conversation_id).await?;
    if !conversation.has_participant(identity) {
        return Err(AppError::ConversationsForbidden);
    }
    Ok(conversation)
}

/// Active conversations of the identity, most recent activity first.
pub async fn list_for_identity<C: Context>(
    ctx: &C,
    identity: &IdentityRef,
    page: u32,
) -> ServiceResult<Vec<Conversation>> {
    identity.validate()?;
    let offset = page.saturating_mul(CONVERSATIONS_PER_PAGE);
    let conversations = match conversations::fetch_many_by_participant(
        ctx,
        identity.kind.as_str(),
        &identity.id,
        CONVERSATIONS_PER_PAGE,
        offset,
    )
    .await
    {
        Ok(conversations) => conversations,
        Err(e) => return store_error(e),
    };
    conversations
        .into_iter()
        .map(Conversation::try_from)
        .collect()
}

pub async fn touch_last_seen<C: Context>(
    ctx: &C,
    conversation_id: Uuid,
    identity: &IdentityRef,
) -> ServiceResult<()> {
    match conversations::touch_last_seen(
        ctx,
        &conversation_id.to_string(),
        identity.kind.as_str(),
        &identity.id,
    )
    .await
    {
        Ok(_) => Ok(()),
        Err(e) => store_error(e),
    }
}

pub async fn deactivate<C: Context>(
    ctx: &C,
    conversation_id: Uuid,
    identity: &IdentityRef,
) -> ServiceResult<Conversation> {
    let mut conversation = fetch_for_participant(ctx, conversation_id, identity).await?;
    if !conversation.active {
        return Ok(conversation);
    }
    match conversations::deactivate(ctx, &conversation_id.to_string()).await {
        Ok(_) => {
            info!(conversation_id = %conversation_id, by = %identity, "Conversation deactivated");
            conversation.active = false;
            Ok(conversation)
        }
        Err(e) => store_error(e),
    }
}

/// Account-deletion cascade: physically removes every conversation the
/// identity took part in, with their messages and notifications.
pub async fn delete_for_identity<C: Context>(
    ctx: &C,
    identity: &IdentityRef,
) -> ServiceResult<DeletedConversationsResponse> {
    identity.validate()?;
    let conversation_ids = match conversations::fetch_ids_by_participant(
        ctx,
        identity.kind.as_str(),
        &identity.id,
    )
    .await
    {
        Ok(conversation_ids) => conversation_ids,
        Err(e) => return store_error(e),
    };
    let deleted = match conversations::delete_many(ctx, &conversation_ids).await {
        Ok(deleted) => deleted,
        Err(e) => return store_error(e),
    };
    info!(
        identity = %identity,
        conversations = deleted.conversations,
        messages = deleted.messages,
        notifications = deleted.notifications,
        "Deleted conversations of identity"
    );
    Ok(DeletedConversationsResponse {
        conversations: deleted.conversations,
        messages: deleted.messages,
        notifications: deleted.notifications,
    })
}
