use crate::common::context::Context;
use crate::common::error::AppError;
use crate::events::EventResult;
use crate::models::connections::Connection;
use crate::models::gateway::{JoinUserChannel, ServerEvent};
use crate::repositories::streams::StreamName;
use crate::usecases::{notifications, presences, streams};

pub async fn handle<C: Context>(
    ctx: &C,
    connection: &mut Connection,
    args: JoinUserChannel,
) -> EventResult {
    let identity = args.identity;
    identity.validate()?;
    if connection
        .identity
        .as_ref()
        .is_some_and(|bound| bound != &identity)
    {
        return Err(AppError::GatewayIdentityMismatch);
    }

    let display_name = ctx.identities().resolve_identity(&identity).await?;
    streams::bind_identity(ctx, connection.connection_id, identity.clone());
    streams::join(
        ctx,
        connection.connection_id,
        StreamName::User(identity.clone()),
    );
    presences::set_online(ctx, &identity, connection.connection_id);
    connection.identity = Some(identity.clone());

    let unread_notifications = notifications::unread_count(ctx, &identity).await?;
    Ok(Some(ServerEvent::UserChannelJoined {
        identity,
        display_name,
        unread_notifications,
    }))
}
