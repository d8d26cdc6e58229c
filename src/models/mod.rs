pub mod api;
pub mod connections;
pub mod conversations;
pub mod gateway;
pub mod identities;
pub mod messages;
pub mod notifications;
