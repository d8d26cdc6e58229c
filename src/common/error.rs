use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

pub type ServiceResult<T> = Result<T, AppError>;
pub type ServiceResponse<T> = ServiceResult<Json<T>>;

#[track_caller]
pub fn unexpected<T, E: Into<anyhow::Error>>(e: E) -> ServiceResult<T> {
    let caller = std::panic::Location::caller();
    error!("An unexpected error has occurred at {caller}: {}", e.into());
    Err(AppError::Unexpected)
}

/// Maps a store failure onto the error taxonomy.
/// Unavailability is retryable, anything else is unexpected.
#[track_caller]
pub fn store_error<T>(e: sqlx::Error) -> ServiceResult<T> {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            let caller = std::panic::Location::caller();
            warn!("Store unavailable at {caller}: {e}");
            Err(AppError::StoreUnavailable)
        }
        e => unexpected(e),
    }
}

pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Forbidden,
    Conflict,
    Transient,
    Internal,
}

#[derive(Debug)]
pub enum AppError {
    Unexpected,
    DecodingRequestFailed,
    StoreUnavailable,
    DirectoryUnavailable,

    IdentitiesInvalid,
    IdentitiesNotFound,

    ProductsNotFound,

    ConversationsNotFound,
    ConversationsForbidden,
    ConversationsSelfConversation,
    ConversationsConflict,

    MessagesInvalidLength,
    MessagesUnsupportedKind,
    MessagesInvalidReceiver,
    MessagesInvalidPageToken,
    MessagesNotFound,
    MessagesForbidden,
    MessagesRateLimited,

    NotificationsNotFound,
    NotificationsForbidden,

    GatewayNotIdentified,
    GatewayIdentityMismatch,
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    #[track_caller]
    fn from(e: E) -> Self {
        unexpected::<(), E>(e).unwrap_err()
    }
}

impl AppError {
    pub const fn as_str(&self) -> &str {
        self.code()
    }

    pub const fn code(&self) -> &'static str {
        match self {
            AppError::Unexpected => "unexpected",
            AppError::DecodingRequestFailed => "decoding_request_failed",
            AppError::StoreUnavailable => "store_unavailable",
            AppError::DirectoryUnavailable => "directory_unavailable",

            AppError::IdentitiesInvalid => "identities.invalid",
            AppError::IdentitiesNotFound => "identities.not_found",

            AppError::ProductsNotFound => "products.not_found",

            AppError::ConversationsNotFound => "conversations.not_found",
            AppError::ConversationsForbidden => "conversations.forbidden",
            AppError::ConversationsSelfConversation => "conversations.self_conversation",
            AppError::ConversationsConflict => "conversations.conflict",

            AppError::MessagesInvalidLength => "messages.invalid_length",
            AppError::MessagesUnsupportedKind => "messages.unsupported_kind",
            AppError::MessagesInvalidReceiver => "messages.invalid_receiver",
            AppError::MessagesInvalidPageToken => "messages.invalid_page_token",
            AppError::MessagesNotFound => "messages.not_found",
            AppError::MessagesForbidden => "messages.forbidden",
            AppError::MessagesRateLimited => "messages.rate_limited",

            AppError::NotificationsNotFound => "notifications.not_found",
            AppError::NotificationsForbidden => "notifications.forbidden",

            AppError::GatewayNotIdentified => "gateway.not_identified",
            AppError::GatewayIdentityMismatch => "gateway.identity_mismatch",
        }
    }

    pub const fn message(&self) -> &'static str {
        match self {
            AppError::Unexpected => "An unexpected error has occurred.",
            AppError::DecodingRequestFailed => "Failed to decode request",
            AppError::StoreUnavailable => "The service is temporarily unavailable. Please retry.",
            AppError::DirectoryUnavailable => {
                "User and product details are temporarily unavailable. Please retry."
            }

            AppError::IdentitiesInvalid => "The identity reference is malformed.",
            AppError::IdentitiesNotFound => "This user does not exist.",

            AppError::ProductsNotFound => "This product does not exist.",

            AppError::ConversationsNotFound => "The conversation could not be found.",
            AppError::ConversationsForbidden => "You are not a participant of this conversation.",
            AppError::ConversationsSelfConversation => "You cannot start a conversation with yourself.",
            AppError::ConversationsConflict => "The conversation was created concurrently.",

            AppError::MessagesInvalidLength => {
                "Your message was too short/long. It has not been sent."
            }
            AppError::MessagesUnsupportedKind => "Only text messages are supported.",
            AppError::MessagesInvalidReceiver => {
                "The receiver is not the other participant of this conversation."
            }
            AppError::MessagesInvalidPageToken => "The page token is invalid.",
            AppError::MessagesNotFound => "The message could not be found.",
            AppError::MessagesForbidden => "You can only delete your own messages.",
            AppError::MessagesRateLimited => {
                "You have sent too many messages in a short period of time."
            }

            AppError::NotificationsNotFound => "The notification could not be found.",
            AppError::NotificationsForbidden => "This notification belongs to another user.",

            AppError::GatewayNotIdentified => "Join your user channel first.",
            AppError::GatewayIdentityMismatch => {
                "This connection is bound to a different identity."
            }
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            AppError::DecodingRequestFailed
            | AppError::IdentitiesInvalid
            | AppError::ConversationsSelfConversation
            | AppError::MessagesInvalidLength
            | AppError::MessagesUnsupportedKind
            | AppError::MessagesInvalidReceiver
            | AppError::MessagesInvalidPageToken => ErrorKind::InvalidInput,

            AppError::IdentitiesNotFound
            | AppError::ProductsNotFound
            | AppError::ConversationsNotFound
            | AppError::MessagesNotFound
            | AppError::NotificationsNotFound => ErrorKind::NotFound,

            AppError::ConversationsForbidden
            | AppError::MessagesForbidden
            | AppError::NotificationsForbidden
            | AppError::GatewayNotIdentified
            | AppError::GatewayIdentityMismatch => ErrorKind::Forbidden,

            AppError::ConversationsConflict => ErrorKind::Conflict,

            AppError::StoreUnavailable
            | AppError::DirectoryUnavailable
            | AppError::MessagesRateLimited => ErrorKind::Transient,

            AppError::Unexpected => ErrorKind::Internal,
        }
    }

    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transient)
    }

    pub const fn http_status_code(&self) -> StatusCode {
        match self {
            AppError::MessagesRateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => match self.kind() {
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub const fn response_parts(&self) -> (StatusCode, Json<ErrorResponse>) {
        let status = self.http_status_code();
        let response = ErrorResponse {
            code: self.code(),
            message: self.message(),
            retryable: self.is_retryable(),
        };
        (status, Json(response))
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: &'static str,
    pub retryable: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.response_parts().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_http_status() {
        assert_eq!(
            AppError::MessagesInvalidLength.http_status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotificationsForbidden.http_status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::ConversationsNotFound.http_status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::MessagesRateLimited.http_status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(AppError::StoreUnavailable.is_retryable());
        assert!(AppError::MessagesRateLimited.is_retryable());
        assert!(AppError::DirectoryUnavailable.is_retryable());
        assert!(!AppError::MessagesInvalidLength.is_retryable());
        assert!(!AppError::Unexpected.is_retryable());
    }

    #[test]
    fn pool_timeouts_are_transient() {
        let err = store_error::<()>(sqlx::Error::PoolTimedOut).unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable));
        let err = store_error::<()>(sqlx::Error::RowNotFound).unwrap_err();
        assert!(matches!(err, AppError::Unexpected));
    }
}
