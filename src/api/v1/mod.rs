pub mod conversations;
pub mod identities;
pub mod messages;
pub mod notifications;
pub mod presence;

use crate::common::state::AppState;
use axum::Router;
use axum::routing::{delete, get, post};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations",
            post(conversations::find_or_create).get(conversations::list),
        )
        .route("/conversations/{id}", delete(conversations::deactivate))
        .route("/conversations/{id}/messages", get(conversations::messages))
        .route("/messages/{id}", delete(messages::delete))
        .route("/notifications", get(notifications::list))
        .route("/notifications/unread_count", get(notifications::unread_count))
        .route("/notifications/read_all", post(notifications::mark_all_read))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/identities/{kind}/{id}", delete(identities::delete))
        .route("/isOnline", get(presence::is_online))
        .route("/onlineUsers", get(presence::online_users))
}
